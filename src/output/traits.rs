//! Sink traits and error types
//!
//! A sink receives the items of one crawled interval. The interval decides
//! where the batch lands (its partition key), so writing the same interval
//! twice replaces the earlier batch instead of appending to it.

use crate::model::{Interval, Item};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while writing a batch
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode item: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for crawled batches
///
/// Implementations must be thread-safe; the runner shares sinks between
/// concurrently crawled intervals.
pub trait Sink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Writes the items crawled for `interval`
    ///
    /// # Arguments
    ///
    /// * `interval` - The interval the items were crawled for
    /// * `items` - The batch, in crawl order; never empty when called by the runner
    fn write_batch(&self, interval: &Interval, items: &[Item]) -> SinkResult<()>;
}
