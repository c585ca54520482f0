//! JSON-lines object-store sink
//!
//! Batches are written as one JSON object per line under
//! `{directory}/{prefix}/{YYYY-MM-DD}/{HH}/articles.json`. The file is
//! written next to its destination and renamed into place.

use crate::config::OutputConfig;
use crate::model::{Interval, Item};
use crate::output::traits::{Sink, SinkError, SinkResult};
use std::io::Write;
use std::path::{Path, PathBuf};

const OBJECT_NAME: &str = "articles.json";

/// Writes batches as JSON-lines objects on the local filesystem
pub struct JsonLinesSink {
    root: PathBuf,
}

impl JsonLinesSink {
    /// Creates a sink rooted at `directory/prefix`
    pub fn new(directory: impl AsRef<Path>, prefix: &str) -> Self {
        Self {
            root: directory.as_ref().join(prefix),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, &config.prefix)
    }

    /// Path of the object holding `interval`'s batch
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use newsapi_crawl::output::JsonLinesSink;
    /// use newsapi_crawl::Interval;
    /// use std::path::Path;
    ///
    /// let start = Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap();
    /// let interval = Interval::starting_at(start, Duration::hours(1)).unwrap();
    /// let sink = JsonLinesSink::new("/data", "newsapi");
    ///
    /// assert_eq!(
    ///     sink.object_path(&interval),
    ///     Path::new("/data/newsapi/2021-03-12/09/articles.json")
    /// );
    /// ```
    pub fn object_path(&self, interval: &Interval) -> PathBuf {
        let mut path = self.root.clone();
        for segment in interval.partition_key().split('/') {
            path.push(segment);
        }
        path.push(OBJECT_NAME);
        path
    }
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Write {
        path: path.display().to_string(),
        source,
    }
}

impl Sink for JsonLinesSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn write_batch(&self, interval: &Interval, items: &[Item]) -> SinkResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let path = self.object_path(interval);
        let dir = path
            .parent()
            .ok_or_else(|| SinkError::Unavailable(format!("No parent for {}", path.display())))?;
        std::fs::create_dir_all(dir).map_err(write_error(dir))?;

        let mut body = Vec::new();
        for item in items {
            serde_json::to_writer(&mut body, item)?;
            body.push(b'\n');
        }

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp).map_err(write_error(&tmp))?;
            file.write_all(&body).map_err(write_error(&tmp))?;
            file.sync_all().map_err(write_error(&tmp))?;
        }
        std::fs::rename(&tmp, &path).map_err(write_error(&path))?;

        tracing::debug!("Wrote {} items to {}", items.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn interval() -> Interval {
        let start = Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap();
        Interval::starting_at(start, Duration::hours(1)).unwrap()
    }

    fn item(title: &str, minute: i64) -> Item {
        let mut payload = Map::new();
        payload.insert("title".to_string(), json!(title));
        payload.insert("source".to_string(), json!({"id": null, "name": "Le Monde"}));
        Item::new(interval().start() + Duration::minutes(minute), payload)
    }

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path(), "newsapi");

        sink.write_batch(&interval(), &[item("Un", 50), item("Deux", 10)])
            .unwrap();

        let path = dir.path().join("newsapi/2021-03-12/09/articles.json");
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["title"], "Un");
        assert_eq!(lines[0]["publishedAt"], "2021-03-12T09:50:00Z");
        assert_eq!(lines[1]["source"]["name"], "Le Monde");
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path(), "newsapi");

        sink.write_batch(&interval(), &[]).unwrap();

        assert!(!sink.object_path(&interval()).exists());
        assert!(!dir.path().join("newsapi").exists());
    }

    #[test]
    fn test_rewrite_replaces_batch() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path(), "newsapi");

        sink.write_batch(&interval(), &[item("Un", 1), item("Deux", 2)])
            .unwrap();
        sink.write_batch(&interval(), &[item("Trois", 3)]).unwrap();

        let path = sink.object_path(&interval());
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["title"], "Trois");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_from_config() {
        let config = OutputConfig {
            directory: "/srv/lake".to_string(),
            prefix: "raw".to_string(),
            database_path: "/srv/index.db".to_string(),
        };
        let sink = JsonLinesSink::from_config(&config);
        assert_eq!(
            sink.object_path(&interval()),
            Path::new("/srv/lake/raw/2021-03-12/09/articles.json")
        );
    }
}
