//! Pinecone inference and integrated-index adapter.
//!
//! Four components share one [`PineconeApi`] handle:
//!
//! - [`PineconeDenseModel`] embeds each query with `POST /embed` into a
//!   `query_vec` column.
//! - [`PineconeSparseModel`] embeds each query into `query_toks`, a
//!   `{token: weight}` map.
//! - [`PineconeReranker`] scores the `text` of every candidate with
//!   `POST /rerank`, one call per `qid` group.
//! - [`PineconeIndexSearch`] queries an integrated index's records
//!   endpoint and returns its hits as a single page.
//!
//! Every call needs an API key (`PINECONE_API_KEY`).

use std::collections::HashMap;
use std::fmt;

use retrieval_core::provider::clamp_limit;
use retrieval_core::table::{DOCNO, LEADING_COLUMNS, QID, QUERY, RANK, SCORE};
use retrieval_core::{
    Page, PageSearch, ProgressCallback, Result, Retriever, RetryPolicy, RowProgress, ServiceError,
    Table,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{LoaderOptions, RetrieverOptions};
use crate::config::{HttpConfig, PINECONE_API_KEY_ENV};
use crate::http;

/// Pinecone control-plane and inference endpoint.
pub const PINECONE_BASE_URL: &str = "https://api.pinecone.io";

/// API version sent in `X-Pinecone-API-Version`.
pub const PINECONE_API_VERSION: &str = "2025-04";

/// Largest `top_k` an index search accepts.
pub const MAX_TOP_K: usize = 10_000;

const PROVIDER: &str = "pinecone";

/// Column holding dense query embeddings.
pub const QUERY_VEC: &str = "query_vec";
/// Column holding sparse query embeddings.
pub const QUERY_TOKS: &str = "query_toks";
/// Column reranked documents are read from.
pub const TEXT: &str = "text";

// ── Configuration ─────────────────────────────────────────────

/// Configuration for the Pinecone adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// Inference endpoint (defaults to `https://api.pinecone.io`).
    pub base_url: String,
    /// API key. Required.
    pub api_key: Option<String>,
    /// Value of the `X-Pinecone-API-Version` header.
    pub api_version: String,
    /// Hosted dense embedding model.
    pub dense_model: String,
    /// Hosted sparse embedding model.
    pub sparse_model: String,
    /// Hosted reranking model.
    pub rerank_model: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            base_url: PINECONE_BASE_URL.into(),
            api_key: None,
            api_version: PINECONE_API_VERSION.into(),
            dense_model: "multilingual-e5-large".into(),
            sparse_model: "pinecone-sparse-english-v0".into(),
            rerank_model: "bge-reranker-v2-m3".into(),
        }
    }
}

impl PineconeConfig {
    /// Config with the API key set.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Set a custom inference endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Which embedding an encoder requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    /// Dense float vector.
    Dense,
    /// Sparse token weights.
    Sparse,
}

// ── Response Types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Option<Vec<f64>>,
    sparse_values: Option<Vec<f64>>,
    sparse_tokens: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    #[serde(default)]
    data: Vec<RerankHit>,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct RecordSearchResponse {
    result: RecordResult,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    #[serde(default)]
    hits: Vec<RecordHit>,
}

#[derive(Debug, Deserialize)]
struct RecordHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: f64,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

fn embedding_value(response: EmbedResponse, kind: EmbeddingKind) -> Result<Value> {
    let embedding = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Response("pinecone: embed returned no data".into()))?;

    match kind {
        EmbeddingKind::Dense => embedding
            .values
            .map(Value::from)
            .ok_or_else(|| ServiceError::Response("pinecone: dense embedding has no values".into())),
        EmbeddingKind::Sparse => {
            let (Some(tokens), Some(weights)) = (embedding.sparse_tokens, embedding.sparse_values)
            else {
                return Err(ServiceError::Response(
                    "pinecone: sparse embedding needs sparse_tokens and sparse_values".into(),
                ));
            };
            if tokens.len() != weights.len() {
                return Err(ServiceError::Response(format!(
                    "pinecone: {} sparse tokens but {} weights",
                    tokens.len(),
                    weights.len()
                )));
            }
            let toks = tokens
                .into_iter()
                .zip(weights)
                .map(|(token, weight)| (token, Value::from(weight)))
                .collect::<serde_json::Map<_, _>>();
            Ok(Value::Object(toks))
        }
    }
}

/// Scores in document order.
fn rerank_scores(response: RerankResponse, documents: usize) -> Result<Vec<f64>> {
    let mut scores = vec![None; documents];
    for hit in response.data {
        let slot = scores.get_mut(hit.index).ok_or_else(|| {
            ServiceError::Response(format!(
                "pinecone: rerank index {} out of range for {documents} documents",
                hit.index
            ))
        })?;
        *slot = Some(hit.score);
    }
    scores
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or_else(|| ServiceError::Response(format!("pinecone: document {i} was not scored")))
        })
        .collect()
}

/// Record fields named like a leading column are dropped so they cannot
/// replace the hit's identity, score or rank.
fn parse_record_hits(response: RecordSearchResponse, offset: usize, limit: usize) -> Page {
    let mut rows = Table::with_columns([DOCNO, SCORE, RANK]);
    for (position, hit) in response.result.hits.into_iter().take(limit).enumerate() {
        let record = [
            (DOCNO.to_string(), Value::String(hit.id)),
            (SCORE.to_string(), Value::from(hit.score)),
            (RANK.to_string(), Value::from(offset + position)),
        ];
        let fields = hit.fields.into_iter().filter(|(name, _)| {
            let reserved = LEADING_COLUMNS.contains(&name.as_str());
            if reserved {
                tracing::debug!(field = %name, "pinecone: skipping record field that shadows a result column");
            }
            !reserved
        });
        rows.push_record(record.into_iter().chain(fields));
    }
    Page::new(rows, None)
}

// ── Adapter ───────────────────────────────────────────────────

/// A handle on the Pinecone API.
#[derive(Clone)]
pub struct PineconeApi {
    config: PineconeConfig,
    api_key: String,
    client: reqwest::Client,
}

impl fmt::Debug for PineconeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeApi")
            .field("base_url", &self.config.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl PineconeApi {
    /// Connect using `PINECONE_API_KEY` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the variable is unset.
    pub fn new() -> Result<Self> {
        let config = PineconeConfig {
            api_key: std::env::var(PINECONE_API_KEY_ENV).ok(),
            ..Default::default()
        };
        Self::with_config(config, &HttpConfig::default())
    }

    /// Connect using explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the API key is missing or the
    /// HTTP client cannot be built.
    pub fn with_config(config: PineconeConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::Config(format!(
                    "pinecone.api_key is required (set it in config or {PINECONE_API_KEY_ENV})"
                ))
            })?;
        let client = http::build_client(http)?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn post(&self, url: String, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.config.api_version)
            .json(body)
    }

    fn inference_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Embed one query string with a hosted model.
    ///
    /// Dense embeddings come back as a JSON array of floats, sparse ones
    /// as a `{token: weight}` object.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, non-success status, or
    /// an embedding of the wrong kind.
    pub async fn embed_query(&self, model: &str, query: &str, kind: EmbeddingKind) -> Result<Value> {
        tracing::trace!(model, query, ?kind, "Pinecone embed");
        let parameters = match kind {
            EmbeddingKind::Dense => json!({"input_type": "query", "truncate": "END"}),
            EmbeddingKind::Sparse => {
                json!({"input_type": "query", "truncate": "END", "return_tokens": true})
            }
        };
        let body = json!({
            "model": model,
            "parameters": parameters,
            "inputs": [{"text": query}],
        });
        let response: EmbedResponse =
            http::send_json(PROVIDER, self.post(self.inference_url("/embed"), &body)).await?;
        embedding_value(response, kind)
    }

    /// Score `documents` against `query`; scores are returned in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, non-success status, or
    /// a response that does not score every document.
    pub async fn rerank(&self, model: &str, query: &str, documents: &[&str]) -> Result<Vec<f64>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        tracing::trace!(model, query, documents = documents.len(), "Pinecone rerank");
        let body = json!({
            "model": model,
            "query": query,
            "documents": documents.iter().map(|text| json!({TEXT: text})).collect::<Vec<_>>(),
            "top_n": documents.len(),
            "return_documents": false,
            "rank_fields": [TEXT],
        });
        let response: RerankResponse =
            http::send_json(PROVIDER, self.post(self.inference_url("/rerank"), &body)).await?;
        rerank_scores(response, documents.len())
    }

    /// Search an integrated index's records by query text.
    ///
    /// `limit` is clamped to `[1, 10000]`. All hits arrive in one page.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure or non-success status.
    pub async fn search_records(
        &self,
        index_host: &str,
        namespace: &str,
        fields: &[String],
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page> {
        let top_k = clamp_limit(limit, 1, MAX_TOP_K);
        tracing::trace!(index_host, namespace, query, top_k, "Pinecone record search");

        let mut body = json!({"query": {"inputs": {"text": query}, "top_k": top_k}});
        if !fields.is_empty() {
            body["fields"] = json!(fields);
        }
        let host = index_host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        let url = format!("{host}/records/namespaces/{namespace}/search");
        let response: RecordSearchResponse =
            http::send_json(PROVIDER, self.post(url, &body)).await?;
        let page = parse_record_hits(response, offset, top_k);
        tracing::debug!(count = page.len(), "Pinecone record hits parsed");
        Ok(page)
    }

    /// Dense query encoder using the configured dense model.
    pub fn dense_model(&self, options: LoaderOptions) -> PineconeDenseModel {
        PineconeDenseModel(QueryEncoder::new(
            self.clone(),
            self.config.dense_model.clone(),
            EmbeddingKind::Dense,
            options,
        ))
    }

    /// Sparse query encoder using the configured sparse model.
    pub fn sparse_model(&self, options: LoaderOptions) -> PineconeSparseModel {
        PineconeSparseModel(QueryEncoder::new(
            self.clone(),
            self.config.sparse_model.clone(),
            EmbeddingKind::Sparse,
            options,
        ))
    }

    /// Reranker using the configured rerank model.
    pub fn reranker(&self, options: LoaderOptions) -> PineconeReranker {
        PineconeReranker {
            api: self.clone(),
            model: self.config.rerank_model.clone(),
            retry: options.retry,
            progress: options.resolved_progress(),
        }
    }

    /// Search over an integrated index (records API).
    pub fn index(&self, index_host: impl Into<String>, namespace: impl Into<String>) -> PineconeIndexSearch {
        PineconeIndexSearch {
            api: self.clone(),
            index_host: index_host.into(),
            namespace: namespace.into(),
            fields: Vec::new(),
        }
    }
}

// ── Query Encoders ────────────────────────────────────────────

struct QueryEncoder {
    api: PineconeApi,
    model: String,
    kind: EmbeddingKind,
    retry: RetryPolicy,
    progress: Option<ProgressCallback>,
}

impl QueryEncoder {
    fn new(api: PineconeApi, model: String, kind: EmbeddingKind, options: LoaderOptions) -> Self {
        Self {
            api,
            model,
            kind,
            progress: options.resolved_progress(),
            retry: options.retry,
        }
    }

    fn column(&self) -> &'static str {
        match self.kind {
            EmbeddingKind::Dense => QUERY_VEC,
            EmbeddingKind::Sparse => QUERY_TOKS,
        }
    }

    fn desc(&self) -> &'static str {
        match self.kind {
            EmbeddingKind::Dense => "PineconeDenseModel",
            EmbeddingKind::Sparse => "PineconeSparseModel",
        }
    }

    async fn transform(&self, input: &Table) -> Result<Table> {
        if !input.has_column(QUERY) {
            return Err(ServiceError::Input(format!(
                "{}: input must have a `{QUERY}` column",
                self.desc()
            )));
        }

        let mut progress = RowProgress::start(self.progress.as_ref(), self.desc(), input.len());
        let mut encoded = Vec::with_capacity(input.len());
        for row in input.rows() {
            let query = row.get_str(QUERY).ok_or_else(|| {
                ServiceError::Input(format!("{}: `{QUERY}` values must be strings", self.desc()))
            })?;
            let value = self
                .retry
                .call(|| self.api.embed_query(&self.model, query, self.kind))
                .await?;
            encoded.push(value);
            progress.advance();
        }

        let mut output = input.clone();
        output.set_column(self.column(), encoded)?;
        Ok(output)
    }
}

impl fmt::Debug for QueryEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.desc())
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Adds a dense `query_vec` column to a query table.
#[derive(Debug)]
pub struct PineconeDenseModel(QueryEncoder);

impl PineconeDenseModel {
    /// Encode every row's `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] without a string `query` column, or
    /// the first embedding failure.
    pub async fn transform(&self, input: &Table) -> Result<Table> {
        self.0.transform(input).await
    }

    /// Encode a single query as `qid = "1"`.
    pub async fn search(&self, query: &str) -> Result<Table> {
        self.0.transform(&Table::from_queries([("1", query)])).await
    }
}

/// Adds a sparse `query_toks` column to a query table.
#[derive(Debug)]
pub struct PineconeSparseModel(QueryEncoder);

impl PineconeSparseModel {
    /// Encode every row's `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] without a string `query` column, or
    /// the first embedding failure.
    pub async fn transform(&self, input: &Table) -> Result<Table> {
        self.0.transform(input).await
    }

    /// Encode a single query as `qid = "1"`.
    pub async fn search(&self, query: &str) -> Result<Table> {
        self.0.transform(&Table::from_queries([("1", query)])).await
    }
}

// ── Reranker ──────────────────────────────────────────────────

/// Rescores candidate documents with a hosted cross-encoder.
pub struct PineconeReranker {
    api: PineconeApi,
    model: String,
    retry: RetryPolicy,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for PineconeReranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeReranker")
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl PineconeReranker {
    /// Rerank each `qid` group of `input` by its `text` column.
    ///
    /// Groups keep their first-seen order; rows inside a group come back
    /// sorted by descending `score` with a 0-based `rank`. Existing
    /// `score`/`rank` columns are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] if `qid`, `query` or `text` is
    /// missing, or the first rerank failure.
    pub async fn transform(&self, input: &Table) -> Result<Table> {
        for column in [QID, QUERY, TEXT] {
            if !input.has_column(column) {
                return Err(ServiceError::Input(format!(
                    "PineconeReranker: input must have a `{column}` column"
                )));
            }
        }

        let rows: Vec<_> = input.rows().collect();
        let mut group_of: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let qid = row.get(QID).map(Value::to_string).unwrap_or_default();
            let g = *group_of.entry(qid).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(i);
        }

        let mut columns: Vec<&str> = input.columns().iter().map(String::as_str).collect();
        columns.retain(|c| *c != SCORE && *c != RANK);
        let mut output = Table::with_columns(columns.iter().copied().chain([SCORE, RANK]));

        let mut progress = RowProgress::start(self.progress.as_ref(), "PineconeReranker", groups.len());
        for members in &groups {
            let first = &rows[members[0]];
            let query = first.get_str(QUERY).ok_or_else(|| {
                ServiceError::Input(format!("PineconeReranker: `{QUERY}` values must be strings"))
            })?;
            let texts = members
                .iter()
                .map(|&i| {
                    rows[i].get_str(TEXT).ok_or_else(|| {
                        ServiceError::Input(format!("PineconeReranker: `{TEXT}` values must be strings"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let scores = self
                .retry
                .call(|| self.api.rerank(&self.model, query, &texts))
                .await?;

            let mut order: Vec<usize> = (0..members.len()).collect();
            order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
            for (rank, &local) in order.iter().enumerate() {
                let row = &rows[members[local]];
                let mut cells: Vec<Value> = columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect();
                cells.push(Value::from(scores[local]));
                cells.push(Value::from(rank));
                output.push_row(cells)?;
            }
            progress.advance();
        }

        output.normalize_columns();
        Ok(output)
    }
}

// ── Index Search ──────────────────────────────────────────────

/// Text search over a Pinecone integrated index, as a [`PageSearch`].
#[derive(Debug, Clone)]
pub struct PineconeIndexSearch {
    api: PineconeApi,
    index_host: String,
    namespace: String,
    fields: Vec<String>,
}

impl PineconeIndexSearch {
    /// Only return these record fields (all fields when empty).
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// The index host this search targets.
    pub fn index_host(&self) -> &str {
        &self.index_host
    }

    /// A retriever over this index.
    pub fn retriever(self, options: RetrieverOptions) -> Retriever<PineconeIndexSearch> {
        options.build(self, "PineconeRetriever")
    }
}

impl PageSearch for PineconeIndexSearch {
    async fn search_page(&self, query: &str, offset: usize, limit: usize) -> Result<Page> {
        self.api
            .search_records(&self.index_host, &self.namespace, &self.fields, query, offset, limit)
            .await
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> PineconeApi {
        PineconeApi::with_config(PineconeConfig::new("test-key"), &HttpConfig::default())
            .expect("client")
    }

    #[test]
    fn missing_key_fails_at_construction() {
        let err = PineconeApi::with_config(PineconeConfig::default(), &HttpConfig::default())
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", api());
        assert!(!debug.contains("test-key"));
    }

    #[test]
    fn dense_embedding_is_float_array() {
        let response: EmbedResponse = serde_json::from_value(json!({
            "model": "multilingual-e5-large",
            "vector_type": "dense",
            "data": [{"values": [0.25, -0.5], "vector_type": "dense"}],
            "usage": {"total_tokens": 3}
        }))
        .expect("valid");
        assert_eq!(embedding_value(response, EmbeddingKind::Dense).unwrap(), json!([0.25, -0.5]));
    }

    #[test]
    fn sparse_embedding_is_token_map() {
        let response: EmbedResponse = serde_json::from_value(json!({
            "data": [{
                "sparse_values": [0.75, 0.5],
                "sparse_indices": [101, 202],
                "sparse_tokens": ["py", "##terrier"],
                "vector_type": "sparse"
            }]
        }))
        .expect("valid");
        assert_eq!(
            embedding_value(response, EmbeddingKind::Sparse).unwrap(),
            json!({"py": 0.75, "##terrier": 0.5})
        );
    }

    #[test]
    fn wrong_embedding_kind_is_mapping_failure() {
        let response: EmbedResponse =
            serde_json::from_value(json!({"data": [{"values": [1.0]}]})).expect("valid");
        let err = embedding_value(response, EmbeddingKind::Sparse).unwrap_err();
        assert_eq!(err.code(), "RESPONSE_INVALID");
    }

    #[test]
    fn rerank_scores_follow_document_order() {
        let response: RerankResponse = serde_json::from_value(json!({
            "data": [{"index": 1, "score": 0.9}, {"index": 0, "score": 0.1}]
        }))
        .expect("valid");
        assert_eq!(rerank_scores(response, 2).unwrap(), vec![0.1, 0.9]);
    }

    #[test]
    fn rerank_scores_must_cover_every_document() {
        let response: RerankResponse =
            serde_json::from_value(json!({"data": [{"index": 0, "score": 0.1}]})).expect("valid");
        assert!(rerank_scores(response, 2).is_err());

        let response: RerankResponse =
            serde_json::from_value(json!({"data": [{"index": 5, "score": 0.1}]})).expect("valid");
        assert!(rerank_scores(response, 2).is_err());
    }

    #[test]
    fn record_hits_flatten_fields() {
        let response: RecordSearchResponse = serde_json::from_value(json!({
            "result": {"hits": [
                {"_id": "d1", "_score": 0.8, "fields": {"chunk_text": "PyTerrier", "category": "ir"}},
                {"_id": "d2", "_score": 0.6, "fields": {"chunk_text": "Other"}}
            ]},
            "usage": {"read_units": 1}
        }))
        .expect("valid");
        let page = parse_record_hits(response, 0, 10);
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_offset, None);
        let columns: Vec<&str> = page.rows.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, ["docno", "score", "rank", "chunk_text", "category"]);
        assert_eq!(page.rows.get(1, "category"), Some(&Value::Null));
        assert_eq!(page.rows.get(0, "score"), Some(&json!(0.8)));
    }

    #[test]
    fn record_fields_cannot_shadow_result_columns() {
        let response: RecordSearchResponse = serde_json::from_value(json!({
            "result": {"hits": [
                {"_id": "d1", "_score": 0.9, "fields": {"rank": 7, "score": "high", "docno": "x", "qid": "q9"}},
                {"_id": "d2", "_score": 0.5, "fields": {"rank": 7, "chunk_text": "kept"}}
            ]}
        }))
        .expect("valid");
        let page = parse_record_hits(response, 0, 10);
        let columns: Vec<&str> = page.rows.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, ["docno", "score", "rank", "chunk_text"]);
        assert_eq!(page.rows.get(0, "docno"), Some(&json!("d1")));
        assert_eq!(page.rows.get(0, "score"), Some(&json!(0.9)));
        assert_eq!(page.rows.get(0, "rank"), Some(&json!(0)));
        assert_eq!(page.rows.get(1, "rank"), Some(&json!(1)));
        assert_eq!(page.rows.get(1, "chunk_text"), Some(&json!("kept")));
    }

    #[tokio::test]
    async fn reranker_requires_text_column() {
        let reranker = api().reranker(LoaderOptions::default().with_verbose(false));
        let err = reranker
            .transform(&Table::from_queries([("1", "q")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INPUT_INVALID");
        assert!(err.to_string().contains("text"));
    }

    #[tokio::test]
    async fn encoder_requires_query_column() {
        let model = api().dense_model(LoaderOptions::default().with_verbose(false));
        let err = model.transform(&Table::with_columns(["qid"])).await.unwrap_err();
        assert_eq!(err.code(), "INPUT_INVALID");
    }

    #[test]
    fn index_search_keeps_fields() {
        let search = api().index("my-index.svc.pinecone.io", "docs").with_fields(["chunk_text"]);
        assert_eq!(search.fields, ["chunk_text"]);
        assert_eq!(search.index_host(), "my-index.svc.pinecone.io");
    }
}
