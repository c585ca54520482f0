//! Storage traits and error types
//!
//! This module defines the trait interface for the article index and
//! associated error types.

use crate::model::{Interval, Item};
use crate::storage::{RunRecord, RunStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A finished crawl to record in the run ledger
#[derive(Debug, Clone)]
pub struct NewRun<'a> {
    pub interval: &'a Interval,
    pub api_calls: u32,
    pub item_count: usize,
    pub status: RunStatus,
    pub error_message: Option<&'a str>,
    pub config_hash: &'a str,
}

/// Trait for article index backends
pub trait ArticleStore {
    // ===== Articles =====

    /// Inserts or replaces articles keyed by surrogate key
    ///
    /// Within the batch and against existing rows the last write wins.
    ///
    /// # Returns
    ///
    /// The number of articles that were not in the index before
    fn upsert_articles(&mut self, interval: &Interval, items: &[Item]) -> StorageResult<usize>;

    /// Counts indexed articles
    fn count_articles(&self) -> StorageResult<u64>;

    /// Counts distinct source names
    fn count_sources(&self) -> StorageResult<u64>;

    /// Sources with the most articles, descending
    fn top_sources(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Articles of one partition, newest first
    fn articles_in_partition(&self, partition_key: &str) -> StorageResult<Vec<Item>>;

    // ===== Run ledger =====

    /// Records a finished crawl
    fn record_run(&mut self, run: &NewRun<'_>) -> StorageResult<i64>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    /// Counts runs by status
    fn count_runs(&self, status: RunStatus) -> StorageResult<u64>;

    /// Sum of upstream calls recorded for runs finished on `day` (UTC)
    fn calls_on(&self, day: NaiveDate) -> StorageResult<u64>;
}
