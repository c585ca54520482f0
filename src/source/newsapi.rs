//! NewsAPI HTTP client
//!
//! This module handles all requests to NewsAPI, including:
//! - Building the HTTP client with user agent and timeouts
//! - `/v2/everything` page queries for the crawler
//! - `/v2/top-headlines` requests for source discovery
//! - Error classification (auth, rate limit, API errors, bad bodies)
//!
//! Nothing here retries: a failed call is reported to the caller as is.

use crate::config::NewsApiConfig;
use crate::model::{timestamp, Item, Page, PageQuery};
use crate::source::{
    ArticleSource, Headline, HeadlinesRequest, HeadlinesSource, TransportError,
};
use crate::NewsCrawlError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Body of a successful `/v2/everything` response
#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(rename = "totalResults", default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<Item>,
}

/// Body of a successful `/v2/top-headlines` response
#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Headline>,
}

/// Body of an error response
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use newsapi_crawl::config::load_config;
/// use newsapi_crawl::source::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// let client = build_http_client(&config.newsapi).unwrap();
/// ```
pub fn build_http_client(config: &NewsApiConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the NewsAPI v2 endpoints
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    /// Creates a client with an explicit API key
    pub fn new(config: &NewsApiConfig, api_key: impl Into<String>) -> Result<Self, NewsCrawlError> {
        let client = build_http_client(config).map_err(|source| TransportError::Http {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Creates a client, resolving the API key from config or environment
    pub fn from_config(config: &NewsApiConfig) -> Result<Self, NewsCrawlError> {
        let api_key = config.resolve_api_key()?;
        Self::new(config, api_key)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/v2/{}", self.base_url, name)
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let url = self.endpoint(endpoint);
        tracing::trace!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&url, e))?;

        if !status.is_success() {
            return Err(classify_error_body(status, &body));
        }

        // NewsAPI reports some failures as `status: "error"` with HTTP 200
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            if value.get("status").and_then(|s| s.as_str()) == Some("error") {
                return Err(classify_error_body(status, &body));
            }
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ArticleSource for NewsApiClient {
    async fn query(&self, query: &PageQuery) -> Result<Page, TransportError> {
        let mut params = vec![
            ("from", timestamp::format_query(&query.from)),
            ("to", timestamp::format_query(&query.to)),
            ("pageSize", query.page_size.to_string()),
        ];
        params.extend(query.filters.to_query_pairs());

        let response: EverythingResponse = self.get_json("everything", &params).await?;

        Ok(Page {
            items: response.articles,
            total_available: response.total_results,
        })
    }
}

#[async_trait]
impl HeadlinesSource for NewsApiClient {
    async fn top_headlines(
        &self,
        request: &HeadlinesRequest,
    ) -> Result<Vec<Headline>, TransportError> {
        let mut params = vec![("category", request.category.clone())];
        if let Some(language) = &request.language {
            params.push(("language", language.clone()));
        }
        if let Some(country) = &request.country {
            params.push(("country", country.clone()));
        }

        let response: HeadlinesResponse = self.get_json("top-headlines", &params).await?;
        Ok(response.articles)
    }
}

fn classify_reqwest_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Maps an error response to a transport error
///
/// | Condition                         | Error          |
/// |-----------------------------------|----------------|
/// | HTTP 401 or `apiKey*` code        | Unauthorized   |
/// | HTTP 429 or `rateLimited` code    | RateLimited    |
/// | anything else                     | Api            |
fn classify_error_body(status: StatusCode, body: &str) -> TransportError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_else(|| "unknown".to_string());
    let message = parsed
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

    if status == StatusCode::UNAUTHORIZED || code.starts_with("apiKey") {
        TransportError::Unauthorized { code, message }
    } else if status == StatusCode::TOO_MANY_REQUESTS || code == "rateLimited" {
        TransportError::RateLimited { code, message }
    } else {
        TransportError::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }
}
