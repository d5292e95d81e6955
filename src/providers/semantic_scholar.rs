//! Semantic Scholar academic graph adapter.
//!
//! Uses the paper relevance search endpoint
//! (`/graph/v1/paper/search`). An API key is optional; without one the
//! shared public rate limit applies and 429s are common, which the retry
//! policy absorbs.

use retrieval_core::provider::{clamp_limit, rank_score};
use retrieval_core::table::{DOCNO, RANK, SCORE};
use retrieval_core::{Page, PageSearch, Result, Retriever, ServiceError, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RetrieverOptions;
use crate::config::HttpConfig;
use crate::http;

/// Public Semantic Scholar API endpoint.
pub const SEMANTIC_SCHOLAR_BASE_URL: &str = "https://api.semanticscholar.org";

/// Largest page the paper search endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Payload columns, in output order after `docno, rank, score`.
pub const DATA_COLUMNS: [&str; 6] = ["title", "abstract", "year", "venue", "url", "authors"];

const PROVIDER: &str = "semantic_scholar";
const FIELDS: &str = "title,abstract,year,venue,url,authors";

/// Configuration for the Semantic Scholar adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticScholarConfig {
    /// Base URL (defaults to `https://api.semanticscholar.org`).
    pub base_url: String,
    /// Optional API key, sent as `x-api-key`.
    pub api_key: Option<String>,
}

impl Default for SemanticScholarConfig {
    fn default() -> Self {
        Self {
            base_url: SEMANTIC_SCHOLAR_BASE_URL.into(),
            api_key: None,
        }
    }
}

impl SemanticScholarConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    next: Option<usize>,
    #[serde(default)]
    data: Vec<serde_json::Map<String, Value>>,
}

fn author_names(paper: &serde_json::Map<String, Value>) -> Value {
    match paper.get("authors") {
        Some(Value::Array(authors)) => Value::Array(
            authors
                .iter()
                .filter_map(|a| a.get("name").cloned())
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn parse_search_response(response: SearchResponse, offset: usize, limit: usize) -> Result<Page> {
    let first = response.offset.unwrap_or(offset);
    let mut rows = Table::with_columns(
        [DOCNO, RANK, SCORE]
            .into_iter()
            .chain(DATA_COLUMNS.iter().copied()),
    );

    for (position, paper) in response.data.iter().take(limit).enumerate() {
        let rank = first + position;
        let docno = paper
            .get("paperId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ServiceError::Response(format!(
                    "semantic_scholar: paper at position {rank} has no paperId"
                ))
            })?;

        let mut row = vec![
            Value::String(docno.to_string()),
            Value::from(rank),
            Value::from(rank_score(rank)),
        ];
        for column in DATA_COLUMNS {
            row.push(match column {
                "authors" => author_names(paper),
                other => paper.get(other).cloned().unwrap_or(Value::Null),
            });
        }
        rows.push_row(row)?;
    }

    Ok(Page::new(rows, response.next).with_total(response.total))
}

/// A handle on the Semantic Scholar API.
#[derive(Debug, Clone)]
pub struct SemanticScholarApi {
    config: SemanticScholarConfig,
    client: reqwest::Client,
}

impl SemanticScholarApi {
    /// Connect with default settings, reading `S2_API_KEY` if set.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let config = SemanticScholarConfig {
            api_key: std::env::var(crate::config::S2_API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            ..Default::default()
        };
        Self::with_config(config, &HttpConfig::default())
    }

    /// Connect using explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the base URL is empty or the HTTP
    /// client cannot be built.
    pub fn with_config(config: SemanticScholarConfig, http: &HttpConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ServiceError::Config(
                "semantic_scholar.base_url must not be empty".into(),
            ));
        }
        let client = http::build_client(http)?;
        Ok(Self { config, client })
    }

    /// Whether requests carry an API key.
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Fetch one page of paper search results.
    ///
    /// `limit` is clamped to `[1, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, non-success status, or
    /// a paper without a `paperId`.
    pub async fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        let limit = clamp_limit(limit, 1, MAX_PAGE_SIZE);
        tracing::trace!(query, offset, limit, "Semantic Scholar search");

        let url = format!(
            "{}/graph/v1/paper/search",
            self.config.base_url.trim_end_matches('/')
        );
        let mut request = self.client.get(url).query(&[
            ("query", query.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("fields", FIELDS.to_string()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response: SearchResponse = http::send_json(PROVIDER, request).await?;
        let page = parse_search_response(response, offset, limit)?;
        tracing::debug!(count = page.len(), total = ?page.total, "Semantic Scholar results parsed");
        Ok(page)
    }

    /// A paper-search retriever.
    pub fn retriever(&self, options: RetrieverOptions) -> Retriever<SemanticScholarSearch> {
        options.build(
            SemanticScholarSearch { api: self.clone() },
            "SemanticScholarRetriever",
        )
    }
}

/// Semantic Scholar paper search as a [`PageSearch`].
#[derive(Debug, Clone)]
pub struct SemanticScholarSearch {
    api: SemanticScholarApi,
}

impl PageSearch for SemanticScholarSearch {
    async fn search_page(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        self.api.search(query, offset, limit).await
    }

    fn name(&self) -> &str {
        "semantic_scholar"
    }
}
