//! Google Programmable Search (Custom Search JSON API) adapter.
//!
//! Requires an API key and a search engine id (`cx`). The API returns at
//! most 10 results per request and addresses pages with a 1-based
//! `start` index. Only the first 100 results of a query are reachable.

use retrieval_core::provider::{clamp_limit, rank_score};
use retrieval_core::table::{DOCNO, RANK, SCORE};
use retrieval_core::{Page, PageSearch, Result, Retriever, ServiceError, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RetrieverOptions;
use crate::config::{GOOGLE_API_KEY_ENV, GOOGLE_CX_ENV, HttpConfig};
use crate::http;

/// Custom Search JSON API endpoint.
pub const GOOGLE_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Largest `num` the API accepts.
pub const MAX_PAGE_SIZE: usize = 10;

/// Results past this 0-based offset are rejected by the API with HTTP 400.
pub const MAX_RESULTS: usize = 100;

const PROVIDER: &str = "google";

/// Configuration for the Google adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Endpoint URL (defaults to the Custom Search JSON API).
    pub base_url: String,
    /// API key. Required.
    pub api_key: Option<String>,
    /// Programmable Search engine id. Required.
    pub cx: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_BASE_URL.into(),
            api_key: None,
            cx: None,
        }
    }
}

impl GoogleConfig {
    /// Config with both credentials set.
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            cx: Some(cx.into()),
            ..Default::default()
        }
    }

    /// Set a custom endpoint URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    search_information: Option<SearchInformation>,
    #[serde(default)]
    queries: Option<Queries>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchInformation {
    total_results: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Queries {
    #[serde(default)]
    next_page: Vec<PageRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRef {
    start_index: usize,
}

#[derive(Debug, Deserialize)]
struct Item {
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
}

fn parse_search_response(response: SearchResponse, offset: usize, limit: usize) -> Result<Page> {
    let mut rows = Table::with_columns([DOCNO, RANK, SCORE, "url", "title", "snippet"]);
    for (position, item) in response.items.into_iter().take(limit).enumerate() {
        let rank = offset + position;
        let link = item.link.filter(|l| !l.is_empty()).ok_or_else(|| {
            ServiceError::Response(format!("google: result at position {rank} has no link"))
        })?;
        rows.push_row(vec![
            Value::String(link.clone()),
            Value::from(rank),
            Value::from(rank_score(rank)),
            Value::String(link),
            item.title.map_or(Value::Null, Value::String),
            item.snippet.map_or(Value::Null, Value::String),
        ])?;
    }

    let next_offset = response
        .queries
        .and_then(|q| q.next_page.into_iter().next())
        .map(|next| next.start_index.saturating_sub(1))
        .filter(|&next| next < MAX_RESULTS);
    let total = response
        .search_information
        .and_then(|info| info.total_results)
        .and_then(|t| t.parse().ok());
    Ok(Page::new(rows, next_offset).with_total(total))
}

/// A handle on the Custom Search JSON API.
#[derive(Debug, Clone)]
pub struct GoogleApi {
    base_url: String,
    api_key: String,
    cx: String,
    client: reqwest::Client,
}

impl GoogleApi {
    /// Connect using `GOOGLE_API_KEY` and `GOOGLE_CX` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if either variable is unset.
    pub fn new() -> Result<Self> {
        let config = GoogleConfig {
            api_key: std::env::var(GOOGLE_API_KEY_ENV).ok(),
            cx: std::env::var(GOOGLE_CX_ENV).ok(),
            ..Default::default()
        };
        Self::with_config(config, &HttpConfig::default())
    }

    /// Connect using explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the key or engine id is missing,
    /// or the HTTP client cannot be built.
    pub fn with_config(config: GoogleConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = required(config.api_key, "google.api_key", GOOGLE_API_KEY_ENV)?;
        let cx = required(config.cx, "google.cx", GOOGLE_CX_ENV)?;
        let client = http::build_client(http)?;
        Ok(Self {
            base_url: config.base_url,
            api_key,
            cx,
            client,
        })
    }

    /// Fetch one page of web results.
    ///
    /// `limit` is clamped to `[1, 10]` and to the 100-result window;
    /// `offset` is 0-based. An offset past the window yields an empty page
    /// without a request.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, non-success status, or
    /// a result without a `link`.
    pub async fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        if offset >= MAX_RESULTS {
            tracing::debug!(offset, "Google result window exhausted");
            return Ok(Page::new(Table::with_columns([DOCNO, RANK, SCORE]), None));
        }
        let limit = clamp_limit(limit, 1, MAX_PAGE_SIZE).min(MAX_RESULTS - offset);
        tracing::trace!(query, offset, limit, "Google search");

        let request = self.client.get(&self.base_url).query(&[
            ("key", self.api_key.clone()),
            ("cx", self.cx.clone()),
            ("q", query.to_string()),
            ("num", limit.to_string()),
            ("start", (offset + 1).to_string()),
        ]);
        let response: SearchResponse = http::send_json(PROVIDER, request).await?;
        let page = parse_search_response(response, offset, limit)?;
        tracing::debug!(count = page.len(), total = ?page.total, "Google results parsed");
        Ok(page)
    }

    /// A web search retriever.
    pub fn retriever(&self, options: RetrieverOptions) -> Retriever<GoogleSearch> {
        options.build(GoogleSearch { api: self.clone() }, "GoogleRetriever")
    }
}

fn required(value: Option<String>, field: &str, env: &str) -> Result<String> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ServiceError::Config(format!("{field} is required (set it in config or {env})"))
    })
}

/// Google web search as a [`PageSearch`].
#[derive(Debug, Clone)]
pub struct GoogleSearch {
    api: GoogleApi,
}

impl PageSearch for GoogleSearch {
    async fn search_page(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        self.api.search(query, offset, limit).await
    }

    fn name(&self) -> &str {
        "google"
    }
}
