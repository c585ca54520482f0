//! newsapi-crawl: complete, time-windowed retrieval from NewsAPI
//!
//! This crate pulls every article published in a bounded time window from an
//! offset-less, rate-limited news API by repeatedly narrowing the query window,
//! validates the result, and republishes it to a JSON-lines object store and a
//! SQLite article index.

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod model;
pub mod output;
pub mod source;
pub mod storage;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for newsapi-crawl operations
#[derive(Debug, Error)]
pub enum NewsCrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Filter error: {0}")]
    Filter(#[from] model::FilterError),

    #[error("Transport error: {0}")]
    Transport(#[from] source::TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Daily call budget exhausted: {used} of {budget} calls already made today")]
    BudgetExhausted { used: u64, budget: u64 },

    #[error("Crawl of {interval} timed out after {seconds}s")]
    TimedOut { interval: model::Interval, seconds: u64 },

    #[error("No source domains configured; run with --discover first")]
    NoDomains,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing API key: set `api-key` or the `{0}` environment variable")]
    MissingApiKey(String),
}

/// Errors that abort a single interval crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Upstream request failed: {0}")]
    Transport(#[from] source::TransportError),

    #[error("No items published in {interval}")]
    EmptyResult { interval: model::Interval },

    #[error("Items span {min} .. {max}, which does not fit in {interval}")]
    SpanViolation {
        min: DateTime<Utc>,
        max: DateTime<Utc>,
        interval: model::Interval,
    },

    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Upstream ignored the narrowing bound: right {right}, earliest item {earliest}")]
    BoundNotNarrowed {
        right: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },
}

/// Result type alias for newsapi-crawl operations
pub type Result<T> = std::result::Result<T, NewsCrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{IntervalCrawler, Runner};
pub use model::{CrawlResult, Filters, Interval, Item, PageQuery};
pub use source::{ArticleSource, HeadlinesSource, NewsApiClient};
