//! Storage module for the article index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Article upserts keyed by a content surrogate key
//! - The run ledger used for daily call accounting

mod dedup;
mod schema;
mod sqlite;
mod traits;

pub use dedup::{dedup_keep_last, item_key, surrogate_key};
pub use sqlite::SqliteStore;
pub use traits::{ArticleStore, NewRun, StorageError, StorageResult};

/// Represents a finished crawl in the run ledger
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub interval_start: String,
    pub interval_end: String,
    pub finished_at: String,
    pub api_calls: u32,
    pub item_count: u32,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub config_hash: String,
}

/// Outcome of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Completed,
    Empty,
    Failed,
    TimedOut,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Empty => "empty",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "empty" => Some(Self::Empty),
            "failed" => Some(Self::Failed),
            "timed_out" => Some(Self::TimedOut),
            _ => None,
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::Completed, Self::Empty, Self::Failed, Self::TimedOut]
    }
}
