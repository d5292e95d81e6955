//! Progress events for per-row retrieval loops.
//!
//! Provides callback-based progress reporting that decouples the fan-out
//! and lookup loops from presentation (terminal bar, GUI, logs). Passing
//! no callback disables reporting.

use std::sync::Arc;

/// Progress events emitted while iterating a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A loop over `total` rows has started.
    Started {
        /// Human-readable label (e.g. `"DblpRetriever"`).
        desc: String,
        /// Number of rows to process.
        total: usize,
    },

    /// One more row has been processed.
    Advanced {
        /// Rows processed so far.
        completed: usize,
        /// Number of rows to process.
        total: usize,
    },

    /// The loop finished (successfully or not).
    Finished {
        /// Label passed in [`ProgressEvent::Started`].
        desc: String,
    },
}

/// Callback type for receiving progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Reports progress for one row loop through an optional callback.
///
/// Sends [`ProgressEvent::Started`] on creation and
/// [`ProgressEvent::Finished`] on drop, so early returns via `?` still
/// close the loop.
pub struct RowProgress<'a> {
    callback: Option<&'a ProgressCallback>,
    desc: &'a str,
    total: usize,
    completed: usize,
}

impl<'a> RowProgress<'a> {
    /// Start reporting a loop of `total` rows.
    pub fn start(callback: Option<&'a ProgressCallback>, desc: &'a str, total: usize) -> Self {
        if let Some(cb) = callback {
            cb(ProgressEvent::Started {
                desc: desc.to_string(),
                total,
            });
        }
        Self {
            callback,
            desc,
            total,
            completed: 0,
        }
    }

    /// Mark one row as done.
    pub fn advance(&mut self) {
        self.completed += 1;
        if let Some(cb) = self.callback {
            cb(ProgressEvent::Advanced {
                completed: self.completed,
                total: self.total,
            });
        }
    }
}

impl Drop for RowProgress<'_> {
    fn drop(&mut self) {
        if let Some(cb) = self.callback {
            cb(ProgressEvent::Finished {
                desc: self.desc.to_string(),
            });
        }
    }
}
