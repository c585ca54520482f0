//! Sink that upserts batches into the SQLite article index

use crate::model::{Interval, Item};
use crate::output::traits::{Sink, SinkError, SinkResult};
use crate::storage::{ArticleStore, SqliteStore};
use std::sync::{Arc, Mutex};

/// Writes batches into a shared article index
///
/// Items are keyed by surrogate key, so the same article delivered twice
/// (page seams, overlapping reruns) is stored once.
pub struct IndexSink {
    store: Arc<Mutex<SqliteStore>>,
}

impl IndexSink {
    pub fn new(store: Arc<Mutex<SqliteStore>>) -> Self {
        Self { store }
    }
}

impl Sink for IndexSink {
    fn name(&self) -> &str {
        "index"
    }

    fn write_batch(&self, interval: &Interval, items: &[Item]) -> SinkResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut store = self
            .store
            .lock()
            .map_err(|e| SinkError::Unavailable(format!("Failed to lock storage: {}", e)))?;
        let inserted = store.upsert_articles(interval, items)?;

        tracing::debug!(
            "Indexed {} items for {} ({} new)",
            items.len(),
            interval,
            inserted
        );
        Ok(())
    }
}
