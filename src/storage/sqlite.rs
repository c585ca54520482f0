//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ArticleStore trait.

use crate::model::{timestamp, Interval, Item};
use crate::storage::dedup::{dedup_keep_last, item_key};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, NewRun, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::NewsCrawlError;
use chrono::{Days, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite article index and run ledger
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(NewsCrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, NewsCrawlError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(crate::storage::StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(crate::storage::StorageError::from)?;

        initialize_schema(&conn).map_err(crate::storage::StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, NewsCrawlError> {
        let conn = Connection::open_in_memory().map_err(crate::storage::StorageError::from)?;
        initialize_schema(&conn).map_err(crate::storage::StorageError::from)?;
        Ok(Self { conn })
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        interval_start: row.get(1)?,
        interval_end: row.get(2)?,
        finished_at: row.get(3)?,
        api_calls: row.get(4)?,
        item_count: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Failed),
        error_message: row.get(7)?,
        config_hash: row.get(8)?,
    })
}

impl ArticleStore for SqliteStore {
    // ===== Articles =====

    fn upsert_articles(&mut self, interval: &Interval, items: &[Item]) -> StorageResult<usize> {
        let now = timestamp::format_iso(&Utc::now());
        let partition = interval.partition_key();
        let items = dedup_keep_last(items);
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut exists =
                tx.prepare("SELECT COUNT(*) FROM articles WHERE article_id = ?1")?;
            let mut upsert = tx.prepare(
                "INSERT INTO articles
                     (article_id, title, source_name, url, published_at, partition_key, payload, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(article_id) DO UPDATE SET
                     title = excluded.title,
                     source_name = excluded.source_name,
                     url = excluded.url,
                     published_at = excluded.published_at,
                     partition_key = excluded.partition_key,
                     payload = excluded.payload,
                     indexed_at = excluded.indexed_at",
            )?;

            for item in &items {
                let key = item_key(item);
                let existing: i64 = exists.query_row(params![key], |row| row.get(0))?;
                if existing == 0 {
                    inserted += 1;
                }

                upsert.execute(params![
                    key,
                    item.title(),
                    item.source_name(),
                    item.url(),
                    timestamp::format_iso(&item.published_at),
                    partition,
                    serde_json::to_string(item)?,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_sources(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT source_name) FROM articles WHERE source_name IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn top_sources(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_name, COUNT(*) AS n FROM articles
             WHERE source_name IS NOT NULL
             GROUP BY source_name
             ORDER BY n DESC, source_name ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row?);
        }
        Ok(sources)
    }

    fn articles_in_partition(&self, partition_key: &str) -> StorageResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM articles WHERE partition_key = ?1 ORDER BY published_at DESC",
        )?;

        let rows = stmt.query_map(params![partition_key], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(serde_json::from_str(&row?)?);
        }
        Ok(items)
    }

    // ===== Run ledger =====

    fn record_run(&mut self, run: &NewRun<'_>) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs
                 (interval_start, interval_end, finished_at, api_calls, item_count, status, error_message, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                timestamp::format_iso(&run.interval.start()),
                timestamp::format_iso(&run.interval.end()),
                timestamp::format_iso(&Utc::now()),
                run.api_calls,
                run.item_count as u32,
                run.status.to_db_string(),
                run.error_message,
                run.config_hash,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, interval_start, interval_end, finished_at, api_calls, item_count,
                    status, error_message, config_hash
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_run)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    fn count_runs(&self, status: RunStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn calls_on(&self, day: NaiveDate) -> StorageResult<u64> {
        // ISO timestamps compare lexicographically
        let from = format!("{}T00:00:00Z", day.format("%Y-%m-%d"));
        let to = match day.checked_add_days(Days::new(1)) {
            Some(next) => format!("{}T00:00:00Z", next.format("%Y-%m-%d")),
            None => "9999-12-31T23:59:59Z".to_string(),
        };

        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(api_calls), 0) FROM runs
             WHERE finished_at >= ?1 AND finished_at < ?2",
            params![from, to],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }
}
