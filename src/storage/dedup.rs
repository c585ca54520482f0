//! Surrogate keys and content deduplication
//!
//! Articles are identified by a hash of their title and source name rather
//! than their URL: publishers often move an article to a new URL without
//! changing it, which would otherwise show up as a duplicate.

use crate::model::Item;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Hex SHA-256 over title and source name
///
/// Each field is prefixed with its byte length, so a `|` or any other
/// character inside a title cannot make two different pairs collide.
/// Missing fields hash as empty strings.
///
/// # Examples
///
/// ```
/// use newsapi_crawl::storage::surrogate_key;
///
/// let a = surrogate_key(Some("Un titre"), Some("Le Monde"));
/// let b = surrogate_key(Some("Un titre"), Some("Le Monde"));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, surrogate_key(Some("Un titre"), Some("Le Figaro")));
/// ```
pub fn surrogate_key(title: Option<&str>, source_name: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    for field in [title.unwrap_or(""), source_name.unwrap_or("")] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Surrogate key of an item
pub fn item_key(item: &Item) -> String {
    surrogate_key(item.title(), item.source_name())
}

/// Drops items whose surrogate key appears again later, keeping the last copy
///
/// Relative order of the surviving items is preserved.
pub fn dedup_keep_last(items: &[Item]) -> Vec<Item> {
    let keys: Vec<String> = items.iter().map(item_key).collect();

    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (index, key) in keys.iter().enumerate() {
        last_index.insert(key.as_str(), index);
    }

    items
        .iter()
        .zip(keys.iter())
        .enumerate()
        .filter(|(index, (_, key))| last_index.get(key.as_str()) == Some(index))
        .map(|(_, (item, _))| item.clone())
        .collect()
}
