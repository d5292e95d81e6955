//! Trait definition for pluggable page-search backends.
//!
//! Each remote service (DBLP, Semantic Scholar, Google, Pinecone)
//! implements [`PageSearch`] to expose one bounded page request. The
//! retry, pagination and fan-out layers are built on top of this trait.

use std::future::Future;

use crate::error::ServiceError;
use crate::table::Table;

/// One bounded slice of a provider's result list for a single query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Result rows in provider rank order.
    pub rows: Table,
    /// Offset of the next page, or `None` when the provider has no more results.
    pub next_offset: Option<usize>,
    /// Total number of matches reported by the provider, if any.
    pub total: Option<usize>,
}

impl Page {
    /// A page with rows and an optional next offset.
    pub fn new(rows: Table, next_offset: Option<usize>) -> Self {
        Self {
            rows,
            next_offset,
            total: None,
        }
    }

    /// Attach the provider-reported total.
    pub fn with_total(mut self, total: Option<usize>) -> Self {
        self.total = total;
        self
    }

    /// Number of rows on this page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A pluggable single-page search backend.
///
/// Implementors build the provider request, clamp `limit` into the
/// provider's accepted range, issue the call, and map the payload into
/// result rows carrying `docno`, `score` and `rank` (rank counted from
/// `offset`). Non-success responses are returned as errors so the retry
/// layer can classify them.
///
/// All implementations must be `Send + Sync` so a retriever can be shared.
pub trait PageSearch: Send + Sync {
    /// Fetch one page of results for `query` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the request fails, the provider answers
    /// with a non-success status, or the payload cannot be mapped.
    fn search_page(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page, ServiceError>> + Send;

    /// Short provider name used in logs and progress descriptions.
    fn name(&self) -> &str;
}

/// Clamp a requested page size into a provider's accepted `[min, max]` range.
pub fn clamp_limit(limit: usize, min: usize, max: usize) -> usize {
    limit.clamp(min, max)
}

/// Synthetic score for providers without a native relevance score.
///
/// Strictly decreasing in rank: `score = -rank`.
pub fn rank_score(rank: usize) -> f64 {
    -(rank as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSource {
        docs: Vec<&'static str>,
    }

    impl PageSearch for FixedSource {
        async fn search_page(
            &self,
            _query: &str,
            offset: usize,
            limit: usize,
        ) -> Result<Page, ServiceError> {
            let mut rows = Table::with_columns(["docno", "rank", "score"]);
            for (i, doc) in self.docs.iter().enumerate().skip(offset).take(limit) {
                rows.push_row(vec![json!(doc), json!(i), json!(rank_score(i))])?;
            }
            let next = offset + rows.len();
            Ok(Page::new(rows, (next < self.docs.len()).then_some(next))
                .with_total(Some(self.docs.len())))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FixedSource>();
    }

    #[tokio::test]
    async fn fixed_source_pages() {
        let source = FixedSource {
            docs: vec!["a", "b", "c"],
        };
        let page = source.search_page("q", 1, 5).await.expect("page");
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.total, Some(3));
        assert_eq!(page.rows.get(0, "rank"), Some(&json!(1)));
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(0, 1, 1000), 1);
        assert_eq!(clamp_limit(5000, 1, 1000), 1000);
        assert_eq!(clamp_limit(37, 1, 10), 10);
        assert_eq!(clamp_limit(7, 1, 10), 7);
    }

    #[test]
    fn rank_score_decreases() {
        assert_eq!(rank_score(0), 0.0);
        assert_eq!(rank_score(4), -4.0);
        assert!(rank_score(2) > rank_score(3));
    }
}
