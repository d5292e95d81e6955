//! Provider adapters.
//!
//! Each module wraps one remote service. Search-style providers implement
//! [`retrieval_core::PageSearch`] and are turned into full retrievers with
//! [`RetrieverOptions`]; lookup-style operations (citations, encoders,
//! reranking) loop over table rows directly and take [`LoaderOptions`].

pub mod dblp;
pub mod google;
pub mod pinecone;
pub mod semantic_scholar;

pub use dblp::{BibtexLoader, DblpApi, DblpBibType, DblpEntityType, DblpSearch};
pub use google::{GoogleApi, GoogleSearch};
pub use pinecone::{
    PineconeApi, PineconeDenseModel, PineconeIndexSearch, PineconeReranker, PineconeSparseModel,
};
pub use semantic_scholar::{SemanticScholarApi, SemanticScholarSearch};

use retrieval_core::{PageSearch, ProgressCallback, Retriever, RetryPolicy};

use crate::progress::terminal_progress;

/// Options shared by every retriever constructor.
#[derive(Clone)]
pub struct RetrieverOptions {
    /// Results to fetch per query.
    pub num_results: usize,
    /// Show a terminal progress bar when no callback is supplied.
    pub verbose: bool,
    /// Rate-limit retry policy applied to each page request.
    pub retry: RetryPolicy,
    /// Explicit progress callback; takes precedence over `verbose`.
    pub progress: Option<ProgressCallback>,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            num_results: 100,
            verbose: false,
            retry: RetryPolicy::default(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for RetrieverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverOptions")
            .field("num_results", &self.num_results)
            .field("verbose", &self.verbose)
            .field("retry", &self.retry)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl RetrieverOptions {
    /// Options fetching `num_results` per query, otherwise default.
    pub fn new(num_results: usize) -> Self {
        Self {
            num_results,
            ..Default::default()
        }
    }

    /// Enable or disable the terminal progress bar.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Report progress through `callback` instead of a terminal bar.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Compose `source` into a retriever labelled `desc`.
    pub(crate) fn build<S: PageSearch>(self, source: S, desc: &str) -> Retriever<S> {
        let progress = resolve_progress(self.progress, self.verbose);
        Retriever::new(source, self.num_results)
            .with_retry(self.retry)
            .with_progress(progress)
            .with_desc(desc)
    }
}

/// Options for row-by-row lookups (citations, encoders, reranking).
#[derive(Clone)]
pub struct LoaderOptions {
    /// Show a terminal progress bar when no callback is supplied.
    pub verbose: bool,
    /// Rate-limit retry policy applied to each remote call.
    pub retry: RetryPolicy,
    /// Explicit progress callback; takes precedence over `verbose`.
    pub progress: Option<ProgressCallback>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            retry: RetryPolicy::default(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("verbose", &self.verbose)
            .field("retry", &self.retry)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl LoaderOptions {
    /// Enable or disable the terminal progress bar.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Report progress through `callback` instead of a terminal bar.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The callback a loader should report through, if any.
    pub(crate) fn resolved_progress(&self) -> Option<ProgressCallback> {
        resolve_progress(self.progress.clone(), self.verbose)
    }
}

fn resolve_progress(explicit: Option<ProgressCallback>, verbose: bool) -> Option<ProgressCallback> {
    explicit.or_else(|| verbose.then(terminal_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn retriever_defaults() {
        let options = RetrieverOptions::default();
        assert_eq!(options.num_results, 100);
        assert!(!options.verbose);
        assert_eq!(options.retry, RetryPolicy::default());
        assert!(options.progress.is_none());
    }

    #[test]
    fn explicit_progress_wins_over_verbose() {
        let callback: ProgressCallback = Arc::new(|_| {});
        let resolved = resolve_progress(Some(Arc::clone(&callback)), false);
        assert!(resolved.is_some_and(|cb| Arc::ptr_eq(&cb, &callback)));
    }

    #[test]
    fn quiet_without_callback_reports_nothing() {
        assert!(resolve_progress(None, false).is_none());
        assert!(resolve_progress(None, true).is_some());
    }

    #[test]
    fn loader_options_builders() {
        let options = LoaderOptions::default()
            .with_verbose(true)
            .with_retry(RetryPolicy::default().with_exponential(false));
        assert!(options.verbose);
        assert!(!options.retry.exponential);
        assert!(options.resolved_progress().is_some());

        let options = LoaderOptions::default();
        assert!(options.resolved_progress().is_none());
    }
}
