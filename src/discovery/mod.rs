//! Source discovery
//!
//! Builds the crawler's domain allow-list by sampling the top headlines of a
//! set of categories and recording the domain each source publishes under.

mod domain;
mod sources_file;

pub use domain::extract_domain;
pub use sources_file::{domains_of, load_sources, replace_sources, update_sources};

use crate::config::DiscoveryConfig;
use crate::source::{HeadlinesRequest, HeadlinesSource, TransportError};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps source names to publisher domains using top headlines
pub struct DomainDiscovery {
    source: Arc<dyn HeadlinesSource>,
    language: Option<String>,
    country: Option<String>,
}

impl DomainDiscovery {
    pub fn new(
        source: Arc<dyn HeadlinesSource>,
        language: Option<String>,
        country: Option<String>,
    ) -> Self {
        Self {
            source,
            language,
            country,
        }
    }

    pub fn from_config(source: Arc<dyn HeadlinesSource>, config: &DiscoveryConfig) -> Self {
        Self::new(source, config.language.clone(), config.country.clone())
    }

    /// Queries every category and merges the source → domain pairs
    ///
    /// One upstream call per category. When a source name shows up more than
    /// once, the last one seen wins. Headlines whose URL has no host are
    /// skipped.
    pub async fn discover_domains(
        &self,
        categories: &[String],
    ) -> Result<HashMap<String, String>, TransportError> {
        let mut sources = HashMap::new();

        for category in categories {
            let request = HeadlinesRequest {
                category: category.clone(),
                language: self.language.clone(),
                country: self.country.clone(),
            };
            let headlines = self.source.top_headlines(&request).await?;
            tracing::debug!("{} headlines in category {}", headlines.len(), category);

            for headline in headlines {
                match extract_domain(&headline.url) {
                    Some(domain) => {
                        sources.insert(headline.source.name, domain);
                    }
                    None => tracing::warn!("Skipping headline with unusable URL: {}", headline.url),
                }
            }
        }

        tracing::info!(
            "Discovered {} sources across {} categories",
            sources.len(),
            categories.len()
        );
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Headline, SourceRef};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeHeadlines {
        by_category: HashMap<String, Vec<Headline>>,
        requests: Mutex<Vec<HeadlinesRequest>>,
    }

    #[async_trait]
    impl HeadlinesSource for FakeHeadlines {
        async fn top_headlines(
            &self,
            request: &HeadlinesRequest,
        ) -> Result<Vec<Headline>, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self
                .by_category
                .get(&request.category)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn headline(name: &str, url: &str) -> Headline {
        Headline {
            source: SourceRef {
                id: None,
                name: name.to_string(),
            },
            url: url.to_string(),
        }
    }

    fn fake() -> Arc<FakeHeadlines> {
        Arc::new(FakeHeadlines {
            by_category: HashMap::from([
                (
                    "general".to_string(),
                    vec![
                        headline("Le Monde", "https://www.lemonde.fr/politique/a.html"),
                        headline("Le Figaro", "https://www.lefigaro.fr/b"),
                    ],
                ),
                (
                    "sports".to_string(),
                    vec![
                        headline("L'Équipe", "https://www.lequipe.fr/c"),
                        headline("Le Figaro", "https://sport24.lefigaro.fr/d"),
                        headline("Broken", "::not a url::"),
                    ],
                ),
            ]),
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_discover_merges_categories_last_write_wins() {
        let source = fake();
        let discovery = DomainDiscovery::new(source.clone(), Some("fr".into()), Some("fr".into()));

        let sources = discovery
            .discover_domains(&["general".to_string(), "sports".to_string()])
            .await
            .unwrap();

        assert_eq!(sources.len(), 3);
        assert_eq!(sources["Le Monde"], "lemonde.fr");
        assert_eq!(sources["Le Figaro"], "sport24.lefigaro.fr");
        assert_eq!(sources["L'Équipe"], "lequipe.fr");
        assert!(!sources.contains_key("Broken"));

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.language.as_deref() == Some("fr")));
        assert!(requests.iter().all(|r| r.country.as_deref() == Some("fr")));
    }

    #[tokio::test]
    async fn test_discover_is_idempotent() {
        let discovery = DomainDiscovery::new(fake(), None, None);
        let categories = vec!["general".to_string(), "sports".to_string()];

        let first = discovery.discover_domains(&categories).await.unwrap();
        let second = discovery.discover_domains(&categories).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_category_yields_nothing() {
        let discovery = DomainDiscovery::new(fake(), None, None);
        let sources = discovery
            .discover_domains(&["science".to_string()])
            .await
            .unwrap();
        assert!(sources.is_empty());
    }
}
