//! DBLP computer-science bibliography adapter.
//!
//! Wraps the public search API (`/search/{publ,author,venue}/api`) and the
//! BibTeX record endpoint (`/rec/{key}.bib`). No API key is needed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use retrieval_services::providers::{DblpApi, DblpEntityType, RetrieverOptions};
//!
//! # async fn example() -> retrieval_core::Result<()> {
//! let dblp = DblpApi::new()?;
//! let retriever = dblp.retriever(DblpEntityType::Publication, RetrieverOptions::new(5));
//! let results = retriever.search("PyTerrier").await?;
//! assert!(results.len() <= 5);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use retrieval_core::provider::{clamp_limit, rank_score};
use retrieval_core::table::{DOCNO, RANK, SCORE};
use retrieval_core::{
    Page, PageSearch, ProgressCallback, Result, Retriever, RetryPolicy, RowProgress, ServiceError,
    Table,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LoaderOptions, RetrieverOptions};
use crate::config::HttpConfig;
use crate::http;

/// Public DBLP endpoint.
pub const DBLP_BASE_URL: &str = "https://dblp.org";

/// Largest page the search API accepts.
pub const MAX_PAGE_SIZE: usize = 1000;

const PROVIDER: &str = "dblp";

// ── Configuration ─────────────────────────────────────────────

/// Configuration for the DBLP adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DblpConfig {
    /// Base URL (defaults to `https://dblp.org`).
    pub base_url: String,
}

impl Default for DblpConfig {
    fn default() -> Self {
        Self {
            base_url: DBLP_BASE_URL.into(),
        }
    }
}

impl DblpConfig {
    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Which DBLP index to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DblpEntityType {
    /// Papers, books, theses (`/search/publ/api`).
    #[default]
    Publication,
    /// Person records (`/search/author/api`).
    Author,
    /// Journals and conference series (`/search/venue/api`).
    Venue,
}

impl DblpEntityType {
    /// Lowercase name used in configuration and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Publication => "publication",
            Self::Author => "author",
            Self::Venue => "venue",
        }
    }

    /// Search endpoint path for this entity type.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Publication => "/search/publ/api",
            Self::Author => "/search/author/api",
            Self::Venue => "/search/venue/api",
        }
    }

    /// Payload columns produced for this entity type, after `docno, rank, score`.
    pub fn data_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Publication => &["title", "authors", "year", "type"],
            Self::Author => &["author"],
            Self::Venue => &["venue", "acronym", "type"],
        }
    }

    /// All entity types.
    pub fn all() -> &'static [DblpEntityType] {
        &[Self::Publication, Self::Author, Self::Venue]
    }
}

impl fmt::Display for DblpEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DblpEntityType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                ServiceError::Config(format!(
                    "unknown DBLP entity type {s:?} (expected publication, author or venue)"
                ))
            })
    }
}

/// Which BibTeX flavour to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DblpBibType {
    /// Standard BibTeX record.
    #[default]
    Standard,
    /// Condensed record with abbreviated fields.
    Condensed,
    /// Record plus its crossref'd parent entry.
    WithCrossref,
}

impl DblpBibType {
    /// Lowercase name used in configuration and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Condensed => "condensed",
            Self::WithCrossref => "with_crossref",
        }
    }

    /// Value of the `param` query parameter on `/rec/{key}.bib`.
    pub fn param(&self) -> &'static str {
        match self {
            Self::Standard => "1",
            Self::Condensed => "0",
            Self::WithCrossref => "2",
        }
    }
}

impl fmt::Display for DblpBibType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DblpBibType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Standard, Self::Condensed, Self::WithCrossref]
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                ServiceError::Config(format!(
                    "unknown DBLP bib type {s:?} (expected standard, condensed or with_crossref)"
                ))
            })
    }
}

// ── Response Types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    hits: Hits,
}

/// DBLP encodes the counters as strings.
#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(rename = "@total")]
    total: Value,
    #[serde(rename = "@sent")]
    sent: Value,
    #[serde(rename = "@first")]
    first: Value,
    #[serde(default)]
    hit: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "@id")]
    id: Option<Value>,
    #[serde(default)]
    info: serde_json::Map<String, Value>,
}

fn parse_count(value: &Value, field: &str) -> Result<usize> {
    let count = match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        _ => None,
    };
    count.ok_or_else(|| ServiceError::Response(format!("dblp: {field} is not a count: {value}")))
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Author lists come back as a single object for one author, an array otherwise.
fn author_names(info: &serde_json::Map<String, Value>) -> Value {
    let Some(authors) = info.get("authors").and_then(|a| a.get("author")) else {
        return Value::Null;
    };
    let entries = match authors {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };
    Value::Array(
        entries
            .into_iter()
            .filter_map(|a| match a {
                Value::String(s) => Some(Value::String(s.clone())),
                other => other.get("text").cloned(),
            })
            .collect(),
    )
}

/// Map a DBLP search response into a [`Page`].
///
/// At most `limit` hits are kept.
fn parse_search_response(
    response: SearchResponse,
    entity_type: DblpEntityType,
    limit: usize,
) -> Result<Page> {
    let hits = response.result.hits;
    let total = parse_count(&hits.total, "@total")?;
    let sent = parse_count(&hits.sent, "@sent")?;
    let first = parse_count(&hits.first, "@first")?;

    let data_columns = entity_type.data_columns();
    let mut rows = Table::with_columns(
        [DOCNO, RANK, SCORE]
            .into_iter()
            .chain(data_columns.iter().copied()),
    );

    for (position, hit) in hits.hit.iter().take(limit).enumerate() {
        let docno = match entity_type {
            DblpEntityType::Publication => hit.info.get("key").and_then(value_to_id),
            DblpEntityType::Author | DblpEntityType::Venue => hit.id.as_ref().and_then(value_to_id),
        }
        .ok_or_else(|| {
            ServiceError::Response(format!(
                "dblp: {entity_type} hit at position {} has no identifier",
                first + position
            ))
        })?;

        let rank = first + position;
        let mut row = vec![Value::String(docno), Value::from(rank), Value::from(rank_score(rank))];
        for column in data_columns {
            row.push(match *column {
                "authors" => author_names(&hit.info),
                other => hit.info.get(other).cloned().unwrap_or(Value::Null),
            });
        }
        rows.push_row(row)?;
    }

    let next = first + sent;
    let next_offset = (sent > 0 && next < total).then_some(next);
    Ok(Page::new(rows, next_offset).with_total(Some(total)))
}

// ── Adapter ───────────────────────────────────────────────────

/// A handle on the DBLP API.
#[derive(Debug, Clone)]
pub struct DblpApi {
    config: DblpConfig,
    client: reqwest::Client,
}

impl DblpApi {
    /// Connect to the public DBLP API with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(DblpConfig::default(), &HttpConfig::default())
    }

    /// Connect using explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the base URL is empty or the HTTP
    /// client cannot be built.
    pub fn with_config(config: DblpConfig, http: &HttpConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ServiceError::Config("dblp.base_url must not be empty".into()));
        }
        let client = http::build_client(http)?;
        Ok(Self { config, client })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Fetch one page of search results.
    ///
    /// `limit` is clamped to `[1, 1000]`. Ranks start at the page's first
    /// index and `score = -rank`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, non-success status, or
    /// a response without the expected `result.hits` structure.
    pub async fn search(
        &self,
        query: &str,
        entity_type: DblpEntityType,
        offset: usize,
        limit: usize,
    ) -> Result<Page> {
        let limit = clamp_limit(limit, 1, MAX_PAGE_SIZE);
        tracing::trace!(query, %entity_type, offset, limit, "DBLP search");

        let url = format!("{}{}", self.base_url(), entity_type.endpoint());
        let request = self.client.get(url).query(&[
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("f", offset.to_string()),
            ("c", limit.to_string()),
        ]);
        let response: SearchResponse = http::send_json(PROVIDER, request).await?;
        let page = parse_search_response(response, entity_type, limit)?;
        tracing::debug!(count = page.len(), total = ?page.total, "DBLP results parsed");
        Ok(page)
    }

    /// Download the BibTeX record for a DBLP key (e.g. `conf/cikm/MacdonaldTMO21`).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure or non-success status.
    pub async fn load_bibtex(&self, docno: &str, bib_type: DblpBibType) -> Result<String> {
        tracing::trace!(docno, %bib_type, "DBLP BibTeX lookup");
        let url = format!("{}/rec/{docno}.bib", self.base_url());
        let request = self.client.get(url).query(&[("param", bib_type.param())]);
        http::send_text(PROVIDER, request).await
    }

    /// A retriever over one entity type.
    pub fn retriever(
        &self,
        entity_type: DblpEntityType,
        options: RetrieverOptions,
    ) -> Retriever<DblpSearch> {
        let source = DblpSearch {
            api: self.clone(),
            entity_type,
        };
        options.build(source, "DblpRetriever")
    }

    /// A loader that appends a `bibtex` column to a table of DBLP keys.
    pub fn bibtex_loader(&self, bib_type: DblpBibType, options: LoaderOptions) -> BibtexLoader {
        BibtexLoader {
            api: self.clone(),
            bib_type,
            retry: options.retry,
            progress: options.resolved_progress(),
        }
    }
}

/// DBLP search bound to one entity type.
#[derive(Debug, Clone)]
pub struct DblpSearch {
    api: DblpApi,
    entity_type: DblpEntityType,
}

impl DblpSearch {
    /// The entity type this search targets.
    pub fn entity_type(&self) -> DblpEntityType {
        self.entity_type
    }
}

impl PageSearch for DblpSearch {
    async fn search_page(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        self.api.search(query, self.entity_type, offset, limit).await
    }

    fn name(&self) -> &str {
        "dblp"
    }
}

// ── Citation Loader ───────────────────────────────────────────

/// Appends a `bibtex` column with one DBLP lookup per row.
pub struct BibtexLoader {
    api: DblpApi,
    bib_type: DblpBibType,
    retry: RetryPolicy,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for BibtexLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BibtexLoader")
            .field("bib_type", &self.bib_type)
            .field("retry", &self.retry)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BibtexLoader {
    /// The BibTeX flavour requested.
    pub fn bib_type(&self) -> DblpBibType {
        self.bib_type
    }

    /// Return `input` with a `bibtex` column, one lookup per `docno`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] if `input` has no string `docno`
    /// column, or the first lookup failure.
    pub async fn transform(&self, input: &Table) -> Result<Table> {
        if !input.has_column(DOCNO) {
            return Err(ServiceError::Input(format!(
                "BibtexLoader: input must have a `{DOCNO}` column"
            )));
        }

        let mut progress = RowProgress::start(self.progress.as_ref(), "DblpBibtexLoader", input.len());
        let mut bibtex = Vec::with_capacity(input.len());
        for row in input.rows() {
            let docno = row.get_str(DOCNO).ok_or_else(|| {
                ServiceError::Input(format!("BibtexLoader: `{DOCNO}` values must be strings"))
            })?;
            let text = self
                .retry
                .call(|| self.api.load_bibtex(docno, self.bib_type))
                .await?;
            bibtex.push(Value::String(text));
            progress.advance();
        }

        let mut output = input.clone();
        output.set_column("bibtex", bibtex)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> SearchResponse {
        serde_json::from_value(value).expect("valid response")
    }

    fn publication_response() -> SearchResponse {
        response(json!({
            "result": {
                "hits": {
                    "@total": "12", "@computed": "12", "@sent": "2", "@first": "10",
                    "hit": [
                        {
                            "@score": "7", "@id": "111",
                            "info": {
                                "authors": {"author": [
                                    {"@pid": "m/CraigMacdonald", "text": "Craig Macdonald"},
                                    {"@pid": "t/NicolaTonellotto", "text": "Nicola Tonellotto"}
                                ]},
                                "title": "Declarative Experimentation in Information Retrieval using PyTerrier.",
                                "year": "2020", "type": "Conference and Workshop Papers",
                                "key": "conf/ictir/MacdonaldT20"
                            }
                        },
                        {
                            "@score": "6", "@id": "112",
                            "info": {
                                "authors": {"author": {"@pid": "x/Solo", "text": "Solo Author"}},
                                "title": "Single author paper.",
                                "year": "2021", "type": "Journal Articles",
                                "key": "journals/x/Solo21"
                            }
                        }
                    ]
                }
            }
        }))
    }

    #[test]
    fn entity_type_parsing() {
        assert_eq!("publication".parse::<DblpEntityType>().unwrap(), DblpEntityType::Publication);
        assert_eq!("author".parse::<DblpEntityType>().unwrap(), DblpEntityType::Author);
        assert_eq!("venue".parse::<DblpEntityType>().unwrap(), DblpEntityType::Venue);
        let err = "paper".parse::<DblpEntityType>().unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn entity_type_endpoints() {
        assert_eq!(DblpEntityType::Publication.endpoint(), "/search/publ/api");
        assert_eq!(DblpEntityType::Author.endpoint(), "/search/author/api");
        assert_eq!(DblpEntityType::Venue.endpoint(), "/search/venue/api");
    }

    #[test]
    fn bib_type_params() {
        assert_eq!(DblpBibType::Standard.param(), "1");
        assert_eq!(DblpBibType::Condensed.param(), "0");
        assert_eq!(DblpBibType::WithCrossref.param(), "2");
        assert_eq!("with_crossref".parse::<DblpBibType>().unwrap(), DblpBibType::WithCrossref);
        assert!("full".parse::<DblpBibType>().is_err());
    }

    #[test]
    fn parses_publication_page() {
        let page = parse_search_response(publication_response(), DblpEntityType::Publication, 100)
            .expect("parse");
        assert_eq!(page.len(), 2);
        assert_eq!(page.total, Some(12));
        assert_eq!(page.next_offset, None);

        let columns: Vec<&str> = page.rows.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, ["docno", "rank", "score", "title", "authors", "year", "type"]);
        assert_eq!(page.rows.get(0, "docno"), Some(&json!("conf/ictir/MacdonaldT20")));
        assert_eq!(page.rows.get(0, "rank"), Some(&json!(10)));
        assert_eq!(page.rows.get(1, "score"), Some(&json!(-11.0)));
        assert_eq!(
            page.rows.get(0, "authors"),
            Some(&json!(["Craig Macdonald", "Nicola Tonellotto"]))
        );
        assert_eq!(page.rows.get(1, "authors"), Some(&json!(["Solo Author"])));
    }

    #[test]
    fn hits_beyond_limit_are_dropped() {
        let page = parse_search_response(publication_response(), DblpEntityType::Publication, 1)
            .expect("parse");
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn next_offset_when_more_remain() {
        let page = parse_search_response(
            response(json!({"result": {"hits": {
                "@total": "12", "@sent": "10", "@first": "0",
                "hit": (0..10).map(|i| json!({"info": {"key": format!("k{i}")}})).collect::<Vec<_>>()
            }}})),
            DblpEntityType::Publication,
            10,
        )
        .expect("parse");
        assert_eq!(page.next_offset, Some(10));
        assert_eq!(page.rows.get(3, "title"), Some(&Value::Null));
    }

    #[test]
    fn parses_author_and_venue_ids() {
        let authors = parse_search_response(
            response(json!({"result": {"hits": {
                "@total": "1", "@sent": "1", "@first": "0",
                "hit": [{"@id": "987", "info": {"author": "Craig Macdonald", "url": "https://dblp.org/pid/m/CraigMacdonald"}}]
            }}})),
            DblpEntityType::Author,
            10,
        )
        .expect("parse");
        let columns: Vec<&str> = authors.rows.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, ["docno", "rank", "score", "author"]);
        assert_eq!(authors.rows.get(0, "docno"), Some(&json!("987")));

        let venues = parse_search_response(
            response(json!({"result": {"hits": {
                "@total": "1", "@sent": "1", "@first": "0",
                "hit": [{"@id": "55", "info": {"venue": "SIGIR", "type": "Conference or Workshop"}}]
            }}})),
            DblpEntityType::Venue,
            10,
        )
        .expect("parse");
        assert_eq!(venues.rows.get(0, "venue"), Some(&json!("SIGIR")));
        assert_eq!(venues.rows.get(0, "acronym"), Some(&Value::Null));
    }

    #[test]
    fn empty_result_has_no_hits_key() {
        let page = parse_search_response(
            response(json!({"result": {"hits": {"@total": "0", "@sent": "0", "@first": "0"}}})),
            DblpEntityType::Publication,
            10,
        )
        .expect("parse");
        assert!(page.is_empty());
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn missing_key_is_mapping_failure() {
        let err = parse_search_response(
            response(json!({"result": {"hits": {
                "@total": "1", "@sent": "1", "@first": "0",
                "hit": [{"info": {"title": "No key"}}]
            }}})),
            DblpEntityType::Publication,
            10,
        )
        .unwrap_err();
        assert_eq!(err.code(), "RESPONSE_INVALID");
    }

    #[test]
    fn empty_base_url_rejected() {
        let err = DblpApi::with_config(DblpConfig::default().with_base_url(" "), &HttpConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn fuse_rank_cutoff_keeps_entity_type() {
        let api = DblpApi::new().expect("client");
        let retriever = api.retriever(
            DblpEntityType::Venue,
            RetrieverOptions::new(100).with_verbose(false),
        );
        let fused = retriever.fuse_rank_cutoff(10).expect("cheaper");
        assert_eq!(fused.num_results(), 10);
        assert_eq!(fused.source().entity_type(), DblpEntityType::Venue);
        assert!(retriever.fuse_rank_cutoff(100).is_none());
    }
}
