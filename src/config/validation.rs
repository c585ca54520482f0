use crate::config::types::{
    Config, CrawlConfig, DiscoveryConfig, NewsApiConfig, OutputConfig, WindowConfig,
    HEADLINE_CATEGORIES,
};
use crate::ConfigError;
use url::Url;

/// Largest page the upstream serves
const MAX_PAGE_SIZE: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_newsapi_config(&config.newsapi)?;
    validate_window_config(&config.window)?;
    validate_crawl_config(&config.crawl)?;
    validate_discovery_config(&config.discovery)?;
    validate_output_config(&config.output)?;
    config
        .filters()
        .map_err(|e| ConfigError::Validation(format!("Invalid [filters]: {}", e)))?;
    Ok(())
}

/// Validates upstream API configuration
fn validate_newsapi_config(config: &NewsApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.daily_call_budget < 1 {
        return Err(ConfigError::Validation(format!(
            "daily-call-budget must be >= 1, got {}",
            config.daily_call_budget
        )));
    }

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api-key-env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the interval window
fn validate_window_config(config: &WindowConfig) -> Result<(), ConfigError> {
    if config.size_seconds < 1 {
        return Err(ConfigError::Validation(
            "window size-seconds must be >= 1".to_string(),
        ));
    }

    // Upper bound keeps durations inside chrono range
    const MAX_SECONDS: u64 = 366 * 24 * 3600;
    if config.size_seconds > MAX_SECONDS || config.offset_seconds > MAX_SECONDS {
        return Err(ConfigError::Validation(format!(
            "window size-seconds and offset-seconds must be <= {}",
            MAX_SECONDS
        )));
    }

    Ok(())
}

/// Validates crawl execution settings
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_crawls < 1 || config.max_concurrent_crawls > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-crawls must be between 1 and 32, got {}",
            config.max_concurrent_crawls
        )));
    }

    if config.crawl_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "crawl-timeout-seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates discovery settings
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "discovery categories cannot be empty".to_string(),
        ));
    }

    for category in &config.categories {
        if !HEADLINE_CATEGORIES.contains(&category.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown headline category '{}', expected one of {}",
                category,
                HEADLINE_CATEGORIES.join(", ")
            )));
        }
    }

    if let Some(country) = &config.country {
        validate_code("country", country)?;
    }

    if let Some(language) = &config.language {
        validate_code("language", language)?;
    }

    if config.sources_path.is_empty() {
        return Err(ConfigError::Validation(
            "sources-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.prefix.contains("..") || config.prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "prefix must be a relative key prefix, got '{}'",
            config.prefix
        )));
    }

    Ok(())
}

/// Two-letter lowercase ISO code (language or country)
fn validate_code(field: &str, code: &str) -> Result<(), ConfigError> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(ConfigError::Validation(format!(
            "{} must be a two-letter lowercase code, got '{}'",
            field, code
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("country", "fr").is_ok());
        assert!(validate_code("language", "en").is_ok());

        assert!(validate_code("country", "").is_err());
        assert!(validate_code("country", "FR").is_err());
        assert!(validate_code("country", "fra").is_err());
        assert!(validate_code("country", "f1").is_err());
    }

    #[test]
    fn test_validate_discovery_categories() {
        let mut config = DiscoveryConfig::default();
        assert!(validate_discovery_config(&config).is_ok());

        config.categories = vec!["politics".to_string()];
        assert!(validate_discovery_config(&config).is_err());

        config.categories = vec![];
        assert!(validate_discovery_config(&config).is_err());
    }

    #[test]
    fn test_validate_crawl_config() {
        let mut config = CrawlConfig::default();
        assert!(validate_crawl_config(&config).is_ok());

        config.max_concurrent_crawls = 0;
        assert!(validate_crawl_config(&config).is_err());
    }

    #[test]
    fn test_validate_output_prefix() {
        let mut config = OutputConfig {
            directory: "./data".to_string(),
            prefix: "newsapi".to_string(),
            database_path: "./articles.db".to_string(),
        };
        assert!(validate_output_config(&config).is_ok());

        config.prefix = "../escape".to_string();
        assert!(validate_output_config(&config).is_err());
    }
}
