//! Second-resolution UTC timestamps and their wire formats

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format used for `from`/`to` query parameters
pub const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used when items are serialized
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats a timestamp for an upstream query parameter
pub fn format_query(ts: &DateTime<Utc>) -> String {
    ts.format(QUERY_FORMAT).to_string()
}

/// Formats a timestamp as ISO-8601 with a `Z` suffix
pub fn format_iso(ts: &DateTime<Utc>) -> String {
    ts.format(ISO_FORMAT).to_string()
}

/// Parses an upstream timestamp and truncates it to whole seconds
///
/// Accepts RFC 3339 (`2021-03-12T10:00:00Z`, `2021-03-12T10:00:00.123+01:00`)
/// and the offset-less query format, which is read as UTC.
///
/// # Examples
///
/// ```
/// use newsapi_crawl::model::timestamp::parse;
///
/// let ts = parse("2021-03-12T10:00:00.750Z").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2021-03-12T10:00:00+00:00");
/// ```
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc).trunc_subsecs(0));
    }
    NaiveDateTime::parse_from_str(value, QUERY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_iso(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}
