//! In-memory upstream source
//!
//! Serves a fixed article set with the same contract as the real API:
//! descending publish-time order, at most `page_size` items per call, both
//! bounds inclusive, `total_available` counting the whole window. Every query
//! is recorded so callers can inspect the requests a crawl made.

use crate::model::{Item, Page, PageQuery};
use crate::source::{ArticleSource, TransportError};
use async_trait::async_trait;
use std::sync::Mutex;

pub struct MemorySource {
    items: Vec<Item>,
    queries: Mutex<Vec<PageQuery>>,
    fail_from_call: Option<usize>,
}

impl MemorySource {
    /// Creates a source over the given items (any order)
    pub fn new(mut items: Vec<Item>) -> Self {
        // Stable sort keeps insertion order among equal timestamps
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Self {
            items,
            queries: Mutex::new(Vec::new()),
            fail_from_call: None,
        }
    }

    /// Makes every call from the `n`th (1-based) onwards fail
    pub fn failing_from_call(mut self, n: usize) -> Self {
        self.fail_from_call = Some(n);
        self
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ArticleSource for MemorySource {
    async fn query(&self, query: &PageQuery) -> Result<Page, TransportError> {
        let call = {
            let mut queries = self
                .queries
                .lock()
                .map_err(|_| TransportError::Unavailable("query log poisoned".to_string()))?;
            queries.push(query.clone());
            queries.len()
        };

        if self.fail_from_call.is_some_and(|n| call >= n) {
            return Err(TransportError::Unavailable(format!(
                "simulated failure on call {}",
                call
            )));
        }

        let matching: Vec<&Item> = self
            .items
            .iter()
            .filter(|item| item.published_at >= query.from && item.published_at <= query.to)
            .collect();

        Ok(Page {
            total_available: matching.len() as u64,
            items: matching
                .into_iter()
                .take(query.page_size as usize)
                .cloned()
                .collect(),
        })
    }
}
