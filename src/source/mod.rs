//! Upstream news sources
//!
//! This module defines the collaborator interfaces the crawler and discovery
//! depend on, and their implementations:
//! - `NewsApiClient`, the HTTP client for NewsAPI
//! - `MemorySource`, an in-memory upstream with the same paging contract

mod memory;
mod newsapi;

pub use memory::MemorySource;
pub use newsapi::{build_http_client, NewsApiClient};

use crate::model::{Page, PageQuery};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by an upstream call
///
/// None of these are retried by the crawler.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("API key rejected ({code}): {message}")]
    Unauthorized { code: String, message: String },

    #[error("Rate limit exceeded ({code}): {message}")]
    RateLimited { code: String, message: String },

    #[error("Upstream returned HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

/// Paged article search, ordered by descending publish time
///
/// Implementations must return at most `query.page_size` items, all with
/// `query.from <= published_at <= query.to`.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn query(&self, query: &PageQuery) -> Result<Page, TransportError>;
}

/// Parameters for a top-headlines request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlinesRequest {
    pub category: String,
    pub language: Option<String>,
    pub country: Option<String>,
}

/// Source reference carried by every article
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// The part of a headline article discovery needs
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Headline {
    pub source: SourceRef,
    pub url: String,
}

/// Current top headlines for a category
#[async_trait]
pub trait HeadlinesSource: Send + Sync {
    async fn top_headlines(
        &self,
        request: &HeadlinesRequest,
    ) -> Result<Vec<Headline>, TransportError>;
}
