//! Time-windowed pagination over an offset-less source
//!
//! The upstream returns results newest first, caps every response at
//! `page_size` items and offers no cursor. The crawler keeps the left bound
//! of the window fixed and moves the right bound down to the earliest item of
//! each full page until a page comes back short:
//!
//! ```text
//! start                                                    end
//!   |--------------------------------------------------------|
//!   |                                   [ page 1: to=end-1s ]
//!   |                   [ page 2: to=min(page 1)-1s ]
//!   [ page 3 (short): to=min(page 2)-1s ]
//! ```
//!
//! The upstream treats `to` as inclusive, so every request sends `right - 1s`.
//! Items sharing a timestamp across a page seam are not deduplicated here.

use crate::config::EmptyPolicy;
use crate::model::{CrawlResult, Filters, Interval, Item, PageQuery};
use crate::source::ArticleSource;
use crate::CrawlError;
use chrono::Duration;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Crawls complete intervals from an `ArticleSource`
#[derive(Clone)]
pub struct IntervalCrawler {
    source: Arc<dyn ArticleSource>,
    page_size: u32,
    on_empty: EmptyPolicy,
}

impl IntervalCrawler {
    /// Creates a crawler that fails on empty intervals
    ///
    /// # Arguments
    ///
    /// * `source` - The upstream to paginate over
    /// * `page_size` - Items requested per call; a page shorter than this ends the crawl
    pub fn new(source: Arc<dyn ArticleSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            on_empty: EmptyPolicy::Fail,
        }
    }

    /// Sets how an interval without items is reported
    pub fn with_empty_policy(mut self, on_empty: EmptyPolicy) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Retrieves every item published in `interval`
    ///
    /// # Arguments
    ///
    /// * `interval` - The window to crawl
    /// * `filters` - Forwarded unchanged on every page request
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Items in the order received, with the number of calls made
    /// * `Err(CrawlError::Transport)` - A page request failed
    /// * `Err(CrawlError::EmptyResult)` - No items and the empty policy is `Fail`
    /// * `Err(CrawlError::SpanViolation)` - The items do not fit in the interval
    /// * `Err(CrawlError::BoundNotNarrowed)` - The upstream ignored the `to` bound
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use newsapi_crawl::source::MemorySource;
    /// use newsapi_crawl::{Filters, Interval, IntervalCrawler, Item};
    /// use std::sync::Arc;
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let start = Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap();
    /// let items = (0..25)
    ///     .map(|i| Item::new(start + Duration::minutes(i), Default::default()))
    ///     .collect();
    ///
    /// let crawler = IntervalCrawler::new(Arc::new(MemorySource::new(items)), 10);
    /// let interval = Interval::starting_at(start, Duration::hours(1)).unwrap();
    /// let result = crawler.crawl(&interval, &Filters::new()).await.unwrap();
    ///
    /// assert_eq!(result.items.len(), 25);
    /// assert_eq!(result.api_calls_made, 3);
    /// # }
    /// ```
    pub async fn crawl(
        &self,
        interval: &Interval,
        filters: &Filters,
    ) -> Result<CrawlResult, CrawlError> {
        let calls = AtomicU32::new(0);
        self.crawl_metered(interval, filters, &calls).await
    }

    /// Like `crawl`, counting every upstream call in `calls` as it is made
    ///
    /// The counter stays accurate when the crawl fails or its future is dropped.
    pub async fn crawl_metered(
        &self,
        interval: &Interval,
        filters: &Filters,
        calls: &AtomicU32,
    ) -> Result<CrawlResult, CrawlError> {
        let left = interval.start();
        let mut right = interval.end();
        let mut accumulated: Vec<Item> = Vec::new();
        let mut api_calls = 0u32;

        loop {
            let query = PageQuery {
                from: left,
                to: right - Duration::seconds(1),
                filters: filters.clone(),
                page_size: self.page_size,
            };

            calls.fetch_add(1, Ordering::Relaxed);
            let page = self.source.query(&query).await?;
            api_calls += 1;

            let received = page.items.len();
            let earliest = page.items.iter().map(|item| item.published_at).min();
            accumulated.extend(page.items);

            tracing::debug!(
                "Page {} for {}: {} items (to={}, total_available={})",
                api_calls,
                interval,
                received,
                query.to,
                page.total_available
            );

            let short_page = received < self.page_size as usize;
            let window_covered = received as u64 >= page.total_available;
            if short_page || window_covered {
                break;
            }

            let Some(earliest) = earliest else {
                break;
            };

            if earliest >= right {
                return Err(CrawlError::BoundNotNarrowed { right, earliest });
            }

            if earliest <= left {
                break;
            }

            right = earliest;
        }

        if accumulated.is_empty() {
            return match self.on_empty {
                EmptyPolicy::Fail => Err(CrawlError::EmptyResult {
                    interval: *interval,
                }),
                EmptyPolicy::Allow => {
                    tracing::info!("No items published in {}", interval);
                    Ok(CrawlResult {
                        items: accumulated,
                        api_calls_made: api_calls,
                    })
                }
            };
        }

        validate_span(interval, &accumulated)?;

        tracing::info!(
            "Crawled {}: {} items in {} calls",
            interval,
            accumulated.len(),
            api_calls
        );

        Ok(CrawlResult {
            items: accumulated,
            api_calls_made: api_calls,
        })
    }
}

/// Checks that a non-empty item set is consistent with its interval
///
/// Fails when the publish times spread over more than the interval's span,
/// or when any item lies outside `[start, end]`.
pub fn validate_span(interval: &Interval, items: &[Item]) -> Result<(), CrawlError> {
    let (Some(min), Some(max)) = (
        items.iter().map(|item| item.published_at).min(),
        items.iter().map(|item| item.published_at).max(),
    ) else {
        return Ok(());
    };

    if max - min > interval.span() || !interval.contains(&min) || !interval.contains(&max) {
        return Err(CrawlError::SpanViolation {
            min,
            max,
            interval: *interval,
        });
    }

    Ok(())
}
