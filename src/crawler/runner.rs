//! Crawl execution
//!
//! The runner wraps the interval crawler with everything a scheduled job
//! needs around it:
//! - Refusing to start once today's upstream calls reach the daily budget
//! - Bounding each crawl's wall-clock time
//! - Recording every outcome in the run ledger
//! - Delivering non-empty batches to the configured sinks
//! - Backfilling a plan of intervals with bounded concurrency

use crate::config::{Config, WindowConfig};
use crate::crawler::scheduler::interval_for;
use crate::crawler::IntervalCrawler;
use crate::discovery::{domains_of, load_sources};
use crate::model::{FilterKey, Filters, Interval};
use crate::output::{IndexSink, JsonLinesSink, Sink};
use crate::source::ArticleSource;
use crate::storage::{ArticleStore, NewRun, RunStatus, SqliteStore, StorageError};
use crate::{CrawlError, NewsCrawlError};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_DAILY_CALL_BUDGET: u64 = 100;
const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Outcome of one successfully crawled interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalReport {
    pub interval: Interval,
    pub status: RunStatus,
    pub item_count: usize,
    pub api_calls: u32,
}

/// Runs interval crawls and publishes their results
#[derive(Clone)]
pub struct Runner {
    crawler: IntervalCrawler,
    filters: Filters,
    window: WindowConfig,
    store: Arc<Mutex<SqliteStore>>,
    sinks: Vec<Arc<dyn Sink>>,
    daily_call_budget: u64,
    crawl_timeout: Duration,
    max_concurrent: usize,
    config_hash: String,
}

impl Runner {
    /// Creates a runner with no sinks and default limits
    ///
    /// # Arguments
    ///
    /// * `crawler` - The crawler to run intervals with
    /// * `filters` - Filters sent with every upstream call
    /// * `window` - How nominal trigger times map to intervals
    /// * `store` - Run ledger (and article index, when an `IndexSink` shares it)
    pub fn new(
        crawler: IntervalCrawler,
        filters: Filters,
        window: WindowConfig,
        store: Arc<Mutex<SqliteStore>>,
    ) -> Self {
        Self {
            crawler,
            filters,
            window,
            store,
            sinks: Vec::new(),
            daily_call_budget: DEFAULT_DAILY_CALL_BUDGET,
            crawl_timeout: DEFAULT_CRAWL_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            config_hash: String::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_daily_call_budget(mut self, budget: u64) -> Self {
        self.daily_call_budget = budget;
        self
    }

    pub fn with_crawl_timeout(mut self, timeout: Duration) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Hash of the configuration recorded with every run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Builds a runner from configuration
    ///
    /// Opens the article index, attaches the JSON-lines and index sinks, and
    /// fills the domain allow-list from the sources file when the configured
    /// filters carry none.
    ///
    /// # Returns
    ///
    /// * `Ok(Runner)` - Ready to run
    /// * `Err(NewsCrawlError::NoDomains)` - No domains, sources or query to search with
    pub fn from_config(
        config: &Config,
        source: Arc<dyn ArticleSource>,
        config_hash: &str,
    ) -> Result<Self, NewsCrawlError> {
        let filters = resolve_filters(config)?;

        let store = Arc::new(Mutex::new(SqliteStore::new(Path::new(
            &config.output.database_path,
        ))?));

        let crawler = IntervalCrawler::new(source, config.newsapi.page_size)
            .with_empty_policy(config.crawl.on_empty);

        Ok(Self::new(crawler, filters, config.window.clone(), store.clone())
            .with_sink(Arc::new(JsonLinesSink::from_config(&config.output)))
            .with_sink(Arc::new(IndexSink::new(store)))
            .with_daily_call_budget(config.newsapi.daily_call_budget)
            .with_crawl_timeout(Duration::from_secs(config.crawl.crawl_timeout_seconds))
            .with_max_concurrent(config.crawl.max_concurrent_crawls as usize)
            .with_config_hash(config_hash))
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    /// Crawls the interval a trigger at `nominal` is responsible for
    pub async fn run_at(&self, nominal: DateTime<Utc>) -> Result<IntervalReport, NewsCrawlError> {
        let interval = interval_for(nominal, &self.window)?;
        self.run_interval(interval).await
    }

    /// Crawls one interval and publishes its items
    ///
    /// Every crawl that was started is recorded in the run ledger, whatever
    /// its outcome. Sinks are not called for empty results.
    ///
    /// Sinks are written in order and the first failure stops the run, which
    /// is then recorded as failed. Batches already written by earlier sinks
    /// stay in place; since every sink replaces or upserts by interval and
    /// key, rerunning the interval brings them back in line.
    pub async fn run_interval(&self, interval: Interval) -> Result<IntervalReport, NewsCrawlError> {
        self.check_budget()?;

        tracing::info!("Crawling {}", interval);
        let calls = AtomicU32::new(0);
        let crawl = self.crawler.crawl_metered(&interval, &self.filters, &calls);

        let result = match tokio::time::timeout(self.crawl_timeout, crawl).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let api_calls = calls.load(Ordering::Relaxed);
                let status = match e {
                    CrawlError::EmptyResult { .. } => RunStatus::Empty,
                    _ => RunStatus::Failed,
                };
                tracing::error!("Crawl of {} failed after {} calls: {}", interval, api_calls, e);
                self.record_failure(&interval, api_calls, status, &e.to_string());
                return Err(e.into());
            }
            Err(_) => {
                let api_calls = calls.load(Ordering::Relaxed);
                let err = NewsCrawlError::TimedOut {
                    interval,
                    seconds: self.crawl_timeout.as_secs(),
                };
                tracing::error!("{} ({} calls made)", err, api_calls);
                self.record_failure(&interval, api_calls, RunStatus::TimedOut, &err.to_string());
                return Err(err);
            }
        };

        let api_calls = result.api_calls_made;
        if result.is_empty() {
            tracing::info!("No items in {} ({} calls)", interval, api_calls);
            self.record(&NewRun {
                interval: &interval,
                api_calls,
                item_count: 0,
                status: RunStatus::Empty,
                error_message: None,
                config_hash: &self.config_hash,
            })?;
            return Ok(IntervalReport {
                interval,
                status: RunStatus::Empty,
                item_count: 0,
                api_calls,
            });
        }

        for sink in &self.sinks {
            if let Err(e) = sink.write_batch(&interval, &result.items) {
                tracing::error!("Sink {} failed for {}: {}", sink.name(), interval, e);
                self.record_failure(&interval, api_calls, RunStatus::Failed, &e.to_string());
                return Err(e.into());
            }
        }

        self.record(&NewRun {
            interval: &interval,
            api_calls,
            item_count: result.len(),
            status: RunStatus::Completed,
            error_message: None,
            config_hash: &self.config_hash,
        })?;

        tracing::info!(
            "Crawled {} items from {} in {} calls",
            result.len(),
            interval,
            api_calls
        );

        Ok(IntervalReport {
            interval,
            status: RunStatus::Completed,
            item_count: result.len(),
            api_calls,
        })
    }

    /// Crawls every interval of a plan, at most `max_concurrent` at a time
    ///
    /// Each interval succeeds or fails on its own. Results are ordered by
    /// interval start.
    pub async fn backfill(
        &self,
        plan: Vec<Interval>,
    ) -> Vec<(Interval, Result<IntervalReport, NewsCrawlError>)> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Backfilling {} intervals, {} at a time",
            plan.len(),
            self.max_concurrent
        );

        for interval in plan {
            let runner = self.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = runner.run_interval(interval).await;
                (interval, outcome)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("Backfill task failed: {}", e),
            }
        }

        results.sort_by_key(|(interval, _)| interval.start());
        results
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SqliteStore>, StorageError> {
        self.store
            .lock()
            .map_err(|e| StorageError::Database(format!("Failed to lock storage: {}", e)))
    }

    fn check_budget(&self) -> Result<(), NewsCrawlError> {
        let used = self.lock_store()?.calls_on(Utc::now().date_naive())?;
        if used >= self.daily_call_budget {
            return Err(NewsCrawlError::BudgetExhausted {
                used,
                budget: self.daily_call_budget,
            });
        }
        Ok(())
    }

    fn record(&self, run: &NewRun<'_>) -> Result<(), StorageError> {
        self.lock_store()?.record_run(run)?;
        Ok(())
    }

    /// Records a failed run; a ledger error is logged so the crawl error wins
    fn record_failure(&self, interval: &Interval, api_calls: u32, status: RunStatus, message: &str) {
        let run = NewRun {
            interval,
            api_calls,
            item_count: 0,
            status,
            error_message: Some(message),
            config_hash: &self.config_hash,
        };
        if let Err(e) = self.record(&run) {
            tracing::error!("Failed to record run for {}: {}", interval, e);
        }
    }
}

/// Configured filters, with domains from the sources file when none are set
fn resolve_filters(config: &Config) -> Result<Filters, NewsCrawlError> {
    let mut filters = config.filters()?;
    if !filters.domains().is_empty() {
        return Ok(filters);
    }

    let sources = load_sources(Path::new(&config.discovery.sources_path))?;
    if !sources.is_empty() {
        let domains = domains_of(&sources);
        tracing::info!(
            "Using {} domains from {}",
            domains.len(),
            config.discovery.sources_path
        );
        filters.set_domains(domains)?;
        return Ok(filters);
    }

    if filters.get(FilterKey::Query).is_none() && filters.get(FilterKey::Sources).is_none() {
        return Err(NewsCrawlError::NoDomains);
    }
    Ok(filters)
}
