//! Persisted source → domain mapping
//!
//! Discovery costs one upstream call per category, so its result is kept in a
//! JSON file (`{"Le Monde": "lemonde.fr", ...}`) that scheduled crawls read
//! instead of calling the API.

use crate::NewsCrawlError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Loads the mapping, returning an empty one if the file does not exist
pub fn load_sources(path: &Path) -> Result<BTreeMap<String, String>, NewsCrawlError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Merges `discovered` into the file at `path`
///
/// Existing entries are kept; entries in `discovered` replace entries with
/// the same name.
///
/// # Returns
///
/// The merged mapping as written
pub fn update_sources(
    path: &Path,
    discovered: &HashMap<String, String>,
) -> Result<BTreeMap<String, String>, NewsCrawlError> {
    let mut sources = load_sources(path)?;
    sources.extend(discovered.iter().map(|(k, v)| (k.clone(), v.clone())));
    write_sources(path, &sources)?;
    Ok(sources)
}

/// Replaces the file at `path` with `discovered`
pub fn replace_sources(
    path: &Path,
    discovered: &HashMap<String, String>,
) -> Result<BTreeMap<String, String>, NewsCrawlError> {
    let sources: BTreeMap<String, String> = discovered
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    write_sources(path, &sources)?;
    Ok(sources)
}

fn write_sources(path: &Path, sources: &BTreeMap<String, String>) -> Result<(), NewsCrawlError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(sources)?)?;

    tracing::info!("Wrote {} sources to {}", sources.len(), path.display());
    Ok(())
}

/// Unique domains of a mapping, sorted
pub fn domains_of(sources: &BTreeMap<String, String>) -> Vec<String> {
    let mut domains: Vec<String> = sources.values().cloned().collect();
    domains.sort();
    domains.dedup();
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let sources = load_sources(&dir.path().join("sources.json")).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn test_update_merges_with_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sources.json");

        let first = HashMap::from([
            ("Le Monde".to_string(), "lemonde.fr".to_string()),
            ("Le Figaro".to_string(), "lefigaro.fr".to_string()),
        ]);
        update_sources(&path, &first).unwrap();

        let second = HashMap::from([
            ("Le Figaro".to_string(), "m.lefigaro.fr".to_string()),
            ("L'Équipe".to_string(), "lequipe.fr".to_string()),
        ]);
        let merged = update_sources(&path, &second).unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged["Le Monde"], "lemonde.fr");
        assert_eq!(merged["Le Figaro"], "m.lefigaro.fr");
        assert_eq!(load_sources(&path).unwrap(), merged);
    }

    #[test]
    fn test_replace_drops_old_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sources.json");

        let first = HashMap::from([("Le Monde".to_string(), "lemonde.fr".to_string())]);
        update_sources(&path, &first).unwrap();

        let second = HashMap::from([("Libération".to_string(), "liberation.fr".to_string())]);
        replace_sources(&path, &second).unwrap();

        let sources = load_sources(&path).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources["Libération"], "liberation.fr");
    }

    #[test]
    fn test_domains_are_unique() {
        let sources = BTreeMap::from([
            ("Le Monde".to_string(), "lemonde.fr".to_string()),
            ("Le Monde Afrique".to_string(), "lemonde.fr".to_string()),
            ("Libération".to_string(), "liberation.fr".to_string()),
        ]);
        assert_eq!(domains_of(&sources), vec!["lemonde.fr", "liberation.fr"]);
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(load_sources(&path), Err(NewsCrawlError::Json(_))));
    }
}
