//! Typed upstream filter parameters
//!
//! Filters are forwarded unchanged on every page request. Only an enumerated
//! set of keys is recognized; anything else is rejected instead of being sent
//! upstream. The narrowing algorithm depends on descending publish-time order,
//! so the sort key is fixed to `publishedAt`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The only ordering the crawler can paginate over
pub const REQUIRED_SORT_ORDER: &str = "publishedAt";

/// Errors raised while building filters
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter key '{0}'")]
    UnknownKey(String),

    #[error("Filter '{0}' has an empty value")]
    EmptyValue(FilterKey),

    #[error("Unsupported sort order '{0}': results must be sorted by publishedAt")]
    UnsupportedOrdering(String),
}

/// Recognized filter keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    Query,
    SearchIn,
    Sources,
    Domains,
    ExcludeDomains,
    Language,
    SortBy,
}

impl FilterKey {
    /// Upstream query parameter name
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Query => "q",
            Self::SearchIn => "searchIn",
            Self::Sources => "sources",
            Self::Domains => "domains",
            Self::ExcludeDomains => "excludeDomains",
            Self::Language => "language",
            Self::SortBy => "sortBy",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for FilterKey {
    type Err = FilterError;

    /// Accepts the upstream parameter name or its kebab-case config spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "q" | "query" => Ok(Self::Query),
            "searchIn" | "search-in" => Ok(Self::SearchIn),
            "sources" => Ok(Self::Sources),
            "domains" => Ok(Self::Domains),
            "excludeDomains" | "exclude-domains" => Ok(Self::ExcludeDomains),
            "language" => Ok(Self::Language),
            "sortBy" | "sort-by" => Ok(Self::SortBy),
            other => Err(FilterError::UnknownKey(other.to_string())),
        }
    }
}

/// A filter value as written in configuration: a string or a list of strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    fn joined(&self) -> String {
        match self {
            Self::One(value) => value.trim().to_string(),
            Self::Many(values) => values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Validated filter bag
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    values: BTreeMap<FilterKey, String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self::new()
    }
}

impl Filters {
    /// Creates filters requesting descending publish-time order
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(FilterKey::SortBy, REQUIRED_SORT_ORDER.to_string());
        Self { values }
    }

    /// Builds filters from raw key/value pairs, rejecting unknown keys
    ///
    /// # Examples
    ///
    /// ```
    /// use newsapi_crawl::model::{FilterKey, FilterValue, Filters};
    ///
    /// let filters = Filters::from_pairs([
    ///     ("language", FilterValue::One("fr".to_string())),
    ///     ("domains", FilterValue::Many(vec!["lemonde.fr".into(), "lefigaro.fr".into()])),
    /// ])
    /// .unwrap();
    /// assert_eq!(filters.get(FilterKey::Domains), Some("lemonde.fr,lefigaro.fr"));
    ///
    /// assert!(Filters::from_pairs([("page", FilterValue::One("2".into()))]).is_err());
    /// ```
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, FilterValue)>,
        K: AsRef<str>,
    {
        let mut filters = Self::new();
        for (key, value) in pairs {
            let key = FilterKey::from_str(key.as_ref())?;
            filters.set(key, value.joined())?;
        }
        Ok(filters)
    }

    /// Sets a filter value
    pub fn set(&mut self, key: FilterKey, value: impl Into<String>) -> Result<(), FilterError> {
        let value = value.into();
        if value.is_empty() {
            return Err(FilterError::EmptyValue(key));
        }
        if key == FilterKey::SortBy && value != REQUIRED_SORT_ORDER {
            return Err(FilterError::UnsupportedOrdering(value));
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Replaces the domain allow-list
    pub fn set_domains<I, S>(&mut self, domains: I) -> Result<(), FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.set(FilterKey::Domains, joined)
    }

    pub fn get(&self, key: FilterKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Domains in the allow-list, if any
    pub fn domains(&self) -> Vec<&str> {
        self.get(FilterKey::Domains)
            .map(|d| d.split(',').collect())
            .unwrap_or_default()
    }

    /// Query parameters in a stable order
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_param(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requests_descending_order() {
        let filters = Filters::new();
        assert_eq!(filters.get(FilterKey::SortBy), Some("publishedAt"));
        assert_eq!(
            filters.to_query_pairs(),
            vec![("sortBy", "publishedAt".to_string())]
        );
    }

    #[test]
    fn test_rejects_unknown_key() {
        let result = Filters::from_pairs([("pageSize", FilterValue::One("20".to_string()))]);
        assert_eq!(result, Err(FilterError::UnknownKey("pageSize".to_string())));
    }

    #[test]
    fn test_rejects_other_ordering() {
        let result = Filters::from_pairs([("sort-by", FilterValue::One("popularity".to_string()))]);
        assert_eq!(
            result,
            Err(FilterError::UnsupportedOrdering("popularity".to_string()))
        );
    }

    #[test]
    fn test_accepts_explicit_published_at() {
        let filters =
            Filters::from_pairs([("sortBy", FilterValue::One("publishedAt".to_string()))]).unwrap();
        assert_eq!(filters, Filters::new());
    }

    #[test]
    fn test_rejects_empty_value() {
        let result = Filters::from_pairs([("domains", FilterValue::Many(vec![]))]);
        assert_eq!(result, Err(FilterError::EmptyValue(FilterKey::Domains)));
    }

    #[test]
    fn test_set_domains() {
        let mut filters = Filters::new();
        filters
            .set_domains(["lemonde.fr", " lefigaro.fr ", ""])
            .unwrap();
        assert_eq!(filters.domains(), vec!["lemonde.fr", "lefigaro.fr"]);
    }

    #[test]
    fn test_query_pairs_use_param_names() {
        let filters = Filters::from_pairs([
            ("language", FilterValue::One("fr".to_string())),
            ("exclude-domains", FilterValue::One("example.com".to_string())),
        ])
        .unwrap();

        let pairs = filters.to_query_pairs();
        assert!(pairs.contains(&("language", "fr".to_string())));
        assert!(pairs.contains(&("excludeDomains", "example.com".to_string())));
        assert!(pairs.contains(&("sortBy", "publishedAt".to_string())));
    }
}
