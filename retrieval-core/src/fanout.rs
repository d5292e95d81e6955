//! Per-row query fan-out and merge.
//!
//! Runs a single-query search once per row of a query table, copies each
//! row's columns onto its results, concatenates everything in query order
//! and normalises the column order. Rows are processed one at a time.

use std::future::Future;

use crate::error::{Result, ServiceError};
use crate::progress::{ProgressCallback, RowProgress};
use crate::table::{Table, QID, QUERY};

/// Turns a single-query search into a multi-query one.
#[derive(Clone)]
pub struct QueryFanout {
    desc: String,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for QueryFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFanout")
            .field("desc", &self.desc)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl QueryFanout {
    /// Create a fan-out labelled `desc` with progress reporting disabled.
    pub fn new(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            progress: None,
        }
    }

    /// Report progress through `callback`.
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Run `search_one` for every row of `queries`.
    ///
    /// The query table must have a string `query` column. Result columns
    /// win over same-named query columns. An empty query table yields an
    /// empty table carrying whichever of `qid`/`query` the input has.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Input`] for a malformed query table, or the
    /// first error raised by `search_one`; no partial results are returned.
    pub async fn run<F, Fut>(&self, queries: &Table, mut search_one: F) -> Result<Table>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Table>>,
    {
        if !queries.has_column(QUERY) {
            return Err(ServiceError::Input(format!(
                "{}: query table must have a `{QUERY}` column",
                self.desc
            )));
        }
        if queries.is_empty() {
            return Ok(Table::with_columns(
                [QID, QUERY].into_iter().filter(|c| queries.has_column(c)),
            ));
        }

        let mut progress = RowProgress::start(self.progress.as_ref(), &self.desc, queries.len());
        let mut results = Vec::with_capacity(queries.len());

        for row in queries.rows() {
            let query = row.get_str(QUERY).ok_or_else(|| {
                ServiceError::Input(format!("{}: `{QUERY}` values must be strings", self.desc))
            })?;
            tracing::trace!(query, "running query");

            let mut result = search_one(query.to_string()).await?;
            for (column, value) in row.iter() {
                if !result.has_column(column) {
                    result.fill_column(column, value.clone());
                }
            }
            tracing::debug!(rows = result.len(), "query complete");
            results.push(result);
            progress.advance();
        }

        let mut merged = Table::concat(results);
        merged.normalize_columns();
        Ok(merged)
    }
}
