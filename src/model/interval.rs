use crate::CrawlError;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;

/// Time window targeted by one crawl
///
/// `end` is the narrowing marker: requests never include it, the upstream
/// receives `end - 1s` as its inclusive upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Creates an interval, requiring `start < end`
    ///
    /// Both bounds are truncated to whole seconds, the resolution of the
    /// upstream's `from`/`to` parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use newsapi_crawl::Interval;
    ///
    /// let start = Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap();
    /// let interval = Interval::new(start, start + Duration::hours(1)).unwrap();
    /// assert_eq!(interval.span(), Duration::hours(1));
    ///
    /// assert!(Interval::new(start, start).is_err());
    /// ```
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CrawlError> {
        let start = start.trunc_subsecs(0);
        let end = end.trunc_subsecs(0);
        if start >= end {
            return Err(CrawlError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates an interval from a start and a positive length
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Result<Self, CrawlError> {
        Self::new(start, start + length)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Nominal span of the interval
    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `ts` lies in `[start, end]`
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts <= self.end
    }

    /// Partition key used by sinks: `YYYY-MM-DD/HH` of the start
    pub fn partition_key(&self) -> String {
        self.start.format("%Y-%m-%d/%H").to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            super::timestamp::format_iso(&self.start),
            super::timestamp::format_iso(&self.end)
        )
    }
}
