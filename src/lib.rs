//! # retrieval-services
//!
//! Remote search services as pluggable retrieval components.
//!
//! Each provider adapter answers one bounded page request; the shared
//! machinery in [`retrieval_core`] turns that into a retriever that runs a
//! whole table of queries, fetches up to `num_results` per query across
//! pages, and backs off when the service rate-limits.
//!
//! ## Providers
//!
//! - DBLP: publication, author and venue search, plus BibTeX lookup
//! - Semantic Scholar: paper search
//! - Google Programmable Search: web search
//! - Pinecone: dense/sparse query encoders, a reranker, and integrated-index search
//!
//! ## Design
//!
//! - Calls are async but strictly sequential: one remote call in flight per retriever
//! - HTTP 429 is retried with (optionally exponential) cooldown; other failures surface at once
//! - Results are [`Table`]s whose leading columns are `qid, query, docno, score, rank`
//! - Query text is only logged at trace level
//!
//! ## Example
//!
//! ```rust,no_run
//! use retrieval_services::providers::{DblpApi, DblpEntityType, RetrieverOptions};
//! use retrieval_services::Table;
//!
//! # async fn example() -> retrieval_services::Result<()> {
//! let retriever = DblpApi::new()?
//!     .retriever(DblpEntityType::Publication, RetrieverOptions::new(10).with_verbose(false));
//! let queries = Table::from_queries([("q1", "dense retrieval"), ("q2", "query expansion")]);
//! let results = retriever.transform(&queries).await?;
//! println!("{}", serde_json::to_string_pretty(&results).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod progress;
pub mod providers;

pub use config::ServicesConfig;
pub use progress::terminal_progress;
pub use retrieval_core::{
    PageSearch, ProgressCallback, ProgressEvent, Result, Retriever, RetryPolicy, ServiceError,
    Table,
};
