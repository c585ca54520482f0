//! Interval scheduling
//!
//! This module maps trigger times to crawl intervals:
//! - A scheduled trigger at nominal time `t` crawls the window that starts
//!   `offset` before `t`, leaving the upstream time to publish late articles
//! - A backfill covers a range with consecutive, non-overlapping windows

use crate::config::WindowConfig;
use crate::model::Interval;
use crate::CrawlError;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Computes the interval crawled for a trigger at `nominal`
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use newsapi_crawl::config::WindowConfig;
/// use newsapi_crawl::crawler::interval_for;
///
/// let window = WindowConfig { size_seconds: 3600, offset_seconds: 3600, align: true };
/// let nominal = Utc.with_ymd_and_hms(2021, 3, 12, 10, 5, 0).unwrap();
///
/// let interval = interval_for(nominal, &window).unwrap();
/// assert_eq!(interval.start(), Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap());
/// assert_eq!(interval.end(), Utc.with_ymd_and_hms(2021, 3, 12, 10, 0, 0).unwrap());
/// ```
pub fn interval_for(nominal: DateTime<Utc>, window: &WindowConfig) -> Result<Interval, CrawlError> {
    let start = nominal - Duration::seconds(window.offset_seconds as i64);
    let start = if window.align {
        align_down(start, window.size_seconds)
    } else {
        start
    };
    Interval::starting_at(start, window_length(window))
}

/// Splits `[from, to)` into consecutive windows
///
/// The first window starts at `from` (aligned down when alignment is on);
/// the last one is the first window that reaches `to`, so the whole range is
/// covered. Offsets do not apply: backfill bounds are interval bounds.
pub fn backfill_plan(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    window: &WindowConfig,
) -> Result<Vec<Interval>, CrawlError> {
    if from >= to {
        return Err(CrawlError::InvalidInterval {
            start: from,
            end: to,
        });
    }

    let length = window_length(window);
    let mut start = if window.align {
        align_down(from, window.size_seconds)
    } else {
        from
    };

    let mut plan = Vec::new();
    while start < to {
        plan.push(Interval::starting_at(start, length)?);
        start += length;
    }
    Ok(plan)
}

fn window_length(window: &WindowConfig) -> Duration {
    Duration::seconds(window.size_seconds.max(1) as i64)
}

/// Rounds `ts` down to a multiple of `size_seconds` since the Unix epoch
fn align_down(ts: DateTime<Utc>, size_seconds: u64) -> DateTime<Utc> {
    let size = size_seconds.max(1) as i64;
    let secs = ts.timestamp();
    let aligned = secs - secs.rem_euclid(size);
    Utc.timestamp_opt(aligned, 0).single().unwrap_or(ts)
}
