use url::Url;

/// Extracts the publisher domain from an article URL
///
/// The host is lowercased and a leading `www.` label removed. Returns `None`
/// for unparseable URLs and URLs without a host.
///
/// # Examples
///
/// ```
/// use newsapi_crawl::discovery::extract_domain;
///
/// assert_eq!(extract_domain("https://www.lemonde.fr/a/b"), Some("lemonde.fr".to_string()));
/// assert_eq!(extract_domain("https://WWW.LeFigaro.fr/"), Some("lefigaro.fr".to_string()));
/// assert_eq!(extract_domain("https://sport.francetvinfo.fr/x"), Some("sport.francetvinfo.fr".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_string())
}
