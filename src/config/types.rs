use crate::model::{FilterError, FilterValue, Filters};
use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for newsapi-crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub newsapi: NewsApiConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Raw upstream filters, validated into `Filters`
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Builds the typed filter bag from the `[filters]` table
    pub fn filters(&self) -> Result<Filters, FilterError> {
        Filters::from_pairs(self.filters.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiConfig {
    /// Base URL of the API (without the `/v2` path)
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Inline API key; takes precedence over `api-key-env`
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum number of articles per response
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum number of upstream calls per UTC day
    #[serde(rename = "daily-call-budget", default = "default_daily_call_budget")]
    pub daily_call_budget: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl NewsApiConfig {
    /// Resolves the API key from the config or the environment
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }
}

/// How a nominal trigger time maps to a crawl interval
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Length of each interval (seconds)
    #[serde(rename = "size-seconds")]
    pub size_seconds: u64,

    /// How far before the nominal time the interval starts (seconds)
    #[serde(rename = "offset-seconds", default)]
    pub offset_seconds: u64,

    /// Align interval starts down to a multiple of the window size
    #[serde(default = "default_true")]
    pub align: bool,
}

/// What a crawl does when an interval contains no items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Fail the crawl with `CrawlError::EmptyResult`
    #[default]
    Fail,
    /// Return an empty result
    Allow,
}

/// Crawl execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    #[serde(rename = "on-empty", default)]
    pub on_empty: EmptyPolicy,

    /// Maximum number of intervals crawled at once during a backfill
    #[serde(rename = "max-concurrent-crawls", default = "default_max_concurrent_crawls")]
    pub max_concurrent_crawls: u32,

    /// Wall-clock limit for one interval crawl (seconds)
    #[serde(rename = "crawl-timeout-seconds", default = "default_crawl_timeout_seconds")]
    pub crawl_timeout_seconds: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            on_empty: EmptyPolicy::default(),
            max_concurrent_crawls: default_max_concurrent_crawls(),
            crawl_timeout_seconds: default_crawl_timeout_seconds(),
        }
    }
}

/// Source discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Top-headline categories to sample
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    /// JSON file mapping source names to domains
    #[serde(rename = "sources-path", default = "default_sources_path")]
    pub sources_path: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            language: None,
            country: None,
            sources_path: default_sources_path(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the JSON-lines object store
    pub directory: String,

    /// Key prefix under the root directory
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Path to the SQLite article index
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Categories offered by the top-headlines endpoint
pub const HEADLINE_CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

fn default_base_url() -> String {
    "https://newsapi.org".to_string()
}

fn default_api_key_env() -> String {
    "NEWSAPI_KEY".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_daily_call_budget() -> u64 {
    100
}

fn default_user_agent() -> String {
    format!("newsapi-crawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_crawls() -> u32 {
    4
}

fn default_crawl_timeout_seconds() -> u64 {
    300
}

fn default_categories() -> Vec<String> {
    HEADLINE_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_sources_path() -> String {
    "./sources.json".to_string()
}

fn default_prefix() -> String {
    "newsapi".to_string()
}
