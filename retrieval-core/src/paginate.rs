//! Turns a single-page fetch into a "fetch up to N results" call.

use std::future::Future;

use crate::error::Result;
use crate::provider::Page;
use crate::table::Table;

/// Collects pages until a target result count is reached or the provider
/// runs out of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAccumulator {
    target: usize,
}

impl PageAccumulator {
    /// Accumulate up to `target` results.
    pub fn new(target: usize) -> Self {
        Self { target }
    }

    /// The configured result count.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Repeatedly call `fetch(offset, limit)` starting at offset 0.
    ///
    /// Each call asks for the remaining count. Collection stops when the
    /// target is met, the provider reports no next offset, or a page comes
    /// back empty. Pages are concatenated in fetch order; a page larger
    /// than requested is kept whole.
    ///
    /// # Errors
    ///
    /// The first failing fetch aborts collection and its error is returned.
    pub async fn collect<F, Fut>(&self, mut fetch: F) -> Result<Table>
    where
        F: FnMut(usize, usize) -> Fut,
        Fut: Future<Output = Result<Page>>,
    {
        let mut pages = Vec::new();
        let mut collected = 0;
        let mut offset = Some(0);

        while collected < self.target {
            let Some(current) = offset else {
                break;
            };
            let page = fetch(current, self.target - collected).await?;
            tracing::debug!(
                offset = current,
                rows = page.len(),
                next = ?page.next_offset,
                total = ?page.total,
                "page fetched"
            );
            collected += page.len();
            offset = page.next_offset;
            let exhausted = page.is_empty();
            pages.push(page.rows);
            if exhausted {
                break;
            }
        }

        Ok(Table::concat(pages))
    }
}
