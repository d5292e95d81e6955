//! # retrieval-core
//!
//! Provider-agnostic plumbing shared by every search adapter.
//!
//! ## Design
//!
//! - [`PageSearch`]: one bounded page request against a remote service
//! - [`RetryPolicy`]: bounded backoff on rate-limit failures only
//! - [`PageAccumulator`]: repeated page calls until N results or exhaustion
//! - [`QueryFanout`]: one search per query row, merged into a single table
//! - [`Retriever`]: all of the above composed, with rank-cutoff fusion
//!
//! Queries run one after another; there is no concurrent fan-out, no cache
//! and no persisted state. Errors propagate unchanged to the caller.

pub mod error;
pub mod fanout;
pub mod paginate;
pub mod progress;
pub mod provider;
pub mod retriever;
pub mod retry;
pub mod table;

pub use error::{Result, ServiceError};
pub use fanout::QueryFanout;
pub use paginate::PageAccumulator;
pub use progress::{ProgressCallback, ProgressEvent, RowProgress};
pub use provider::{Page, PageSearch};
pub use retriever::Retriever;
pub use retry::RetryPolicy;
pub use table::Table;
