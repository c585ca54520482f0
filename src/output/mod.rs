//! Output module for crawled batches and statistics
//!
//! This module handles:
//! - The `Sink` interface crawled batches are delivered through
//! - Writing batches as JSON-lines objects partitioned by interval
//! - Upserting batches into the article index
//! - Printing index and run statistics

mod index;
mod jsonl;
pub mod stats;
mod traits;

pub use index::IndexSink;
pub use jsonl::JsonLinesSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{Sink, SinkError, SinkResult};
