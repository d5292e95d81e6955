//! The full retrieval operation built from a [`PageSearch`] backend.
//!
//! ```text
//! query table ─► QueryFanout ─► PageAccumulator(N) ─► RetryPolicy ─► search_page
//! ```
//!
//! Retries wrap each page request, so a throttled second page does not
//! refetch the first.

use std::sync::Arc;

use crate::error::Result;
use crate::fanout::QueryFanout;
use crate::paginate::PageAccumulator;
use crate::progress::ProgressCallback;
use crate::provider::PageSearch;
use crate::retry::RetryPolicy;
use crate::table::Table;

/// Retrieves up to `num_results` rows per query from a page-search backend.
pub struct Retriever<S> {
    source: Arc<S>,
    num_results: usize,
    retry: RetryPolicy,
    progress: Option<ProgressCallback>,
    desc: String,
}

impl<S> Clone for Retriever<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            num_results: self.num_results,
            retry: self.retry,
            progress: self.progress.clone(),
            desc: self.desc.clone(),
        }
    }
}

impl<S> std::fmt::Debug for Retriever<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("desc", &self.desc)
            .field("num_results", &self.num_results)
            .field("retry", &self.retry)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl<S: PageSearch> Retriever<S> {
    /// Create a retriever over `source` with default retry and no progress.
    pub fn new(source: S, num_results: usize) -> Self {
        Self::from_shared(Arc::new(source), num_results)
    }

    /// Create a retriever over an already shared `source`.
    pub fn from_shared(source: Arc<S>, num_results: usize) -> Self {
        let desc = source.name().to_string();
        Self {
            source,
            num_results,
            retry: RetryPolicy::default(),
            progress: None,
            desc,
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Report per-query progress through `callback`.
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Label used for progress reporting.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Number of results fetched per query.
    pub fn num_results(&self) -> usize {
        self.num_results
    }

    /// The retry policy applied to each page request.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The underlying page-search backend.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch up to `num_results` rows for a single query string.
    ///
    /// # Errors
    ///
    /// Propagates the first page failure that the retry policy does not absorb.
    pub async fn search_one(&self, query: &str) -> Result<Table> {
        let source = self.source.as_ref();
        let retry = &self.retry;
        PageAccumulator::new(self.num_results)
            .collect(move |offset, limit| {
                retry.call(move || source.search_page(query, offset, limit))
            })
            .await
    }

    /// Run every row of `queries` and return the merged result table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ServiceError::Input`] if `queries` has no `query`
    /// column, or the first retrieval failure.
    pub async fn transform(&self, queries: &Table) -> Result<Table> {
        QueryFanout::new(self.desc.clone())
            .with_progress(self.progress.clone())
            .run(queries, move |query| async move { self.search_one(&query).await })
            .await
    }

    /// Run a single query as a one-row query table with `qid = "1"`.
    ///
    /// # Errors
    ///
    /// Same as [`Retriever::transform`].
    pub async fn search(&self, query: &str) -> Result<Table> {
        self.transform(&Table::from_queries([("1", query)])).await
    }

    /// A cheaper retriever for a rank cutoff `k`.
    ///
    /// Returns `Some` only when `k` is strictly less than the configured
    /// result count; otherwise no cheaper variant exists.
    pub fn fuse_rank_cutoff(&self, k: usize) -> Option<Self> {
        (k < self.num_results).then(|| Self {
            num_results: k,
            ..self.clone()
        })
    }
}
