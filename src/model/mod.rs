//! Data model shared by the crawler, sources and sinks
//!
//! This module contains:
//! - `Interval`, the time window a crawl targets
//! - `Item`, an article with its mandatory publish time and opaque payload
//! - `PageQuery` and `CrawlResult`, the crawler's request and result shapes
//! - `Filters`, the typed upstream filter bag
//! - Wire timestamp helpers

mod filters;
mod interval;
mod item;
pub mod timestamp;

pub use filters::{FilterError, FilterKey, FilterValue, Filters, REQUIRED_SORT_ORDER};
pub use interval::Interval;
pub use item::Item;

use chrono::{DateTime, Utc};

/// A single request sent to the upstream source
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Inclusive lower bound
    pub from: DateTime<Utc>,

    /// Inclusive upper bound
    pub to: DateTime<Utc>,

    /// Filters forwarded unchanged on every page
    pub filters: Filters,

    /// Maximum number of items per response
    pub page_size: u32,
}

/// One upstream response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Items in descending publish-time order
    pub items: Vec<Item>,

    /// Total number of results the upstream reports for the query window
    pub total_available: u64,
}

/// Items retrieved for one interval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlResult {
    /// Items in the order received; not sorted across pages, not deduplicated
    pub items: Vec<Item>,

    /// Number of upstream calls the crawl spent
    pub api_calls_made: u32,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
