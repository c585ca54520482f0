//! Statistics generation from the article index
//!
//! This module provides functionality for extracting and displaying
//! index and run-ledger statistics from the storage layer.

use crate::storage::{ArticleStore, RunRecord, RunStatus};
use crate::NewsCrawlError;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

const TOP_SOURCES: usize = 10;
const RECENT_RUNS: usize = 5;

/// Index and ledger statistics
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of indexed articles
    pub total_articles: u64,

    /// Number of distinct sources
    pub unique_sources: u64,

    /// Sources with the most articles
    pub top_sources: Vec<(String, u64)>,

    /// Count of runs by outcome
    pub runs_by_status: HashMap<RunStatus, u64>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,

    /// Day the call count refers to (UTC)
    pub day: NaiveDate,

    /// Upstream calls recorded on `day`
    pub calls_today: u64,
}

impl CrawlStatistics {
    pub fn total_runs(&self) -> u64 {
        self.runs_by_status.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(NewsCrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn ArticleStore) -> Result<CrawlStatistics, NewsCrawlError> {
    let mut runs_by_status = HashMap::new();
    for status in RunStatus::all() {
        let count = storage.count_runs(status)?;
        if count > 0 {
            runs_by_status.insert(status, count);
        }
    }

    let day = Utc::now().date_naive();

    Ok(CrawlStatistics {
        total_articles: storage.count_articles()?,
        unique_sources: storage.count_sources()?,
        top_sources: storage.top_sources(TOP_SOURCES)?,
        runs_by_status,
        recent_runs: storage.recent_runs(RECENT_RUNS)?,
        day,
        calls_today: storage.calls_on(day)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `daily_call_budget` - The configured budget, shown next to today's calls
pub fn print_statistics(stats: &CrawlStatistics, daily_call_budget: u64) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Indexed articles: {}", stats.total_articles);
    println!("  Unique sources: {}", stats.unique_sources);
    println!(
        "  API calls on {}: {} / {}",
        stats.day, stats.calls_today, daily_call_budget
    );
    println!();

    if !stats.top_sources.is_empty() {
        println!("Top Sources:");
        for (source, count) in &stats.top_sources {
            println!("  {}: {}", source, count);
        }
        println!();
    }

    let total_runs = stats.total_runs();
    println!("Runs by Status:");
    let mut status_counts: Vec<_> = stats.runs_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if total_runs > 0 {
            (*count as f64 / total_runs as f64) * 100.0
        } else {
            0.0
        };
        println!(
            "  {}: {} ({:.1}%)",
            status.to_db_string(),
            count,
            percentage
        );
    }
    println!();

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            print!(
                "  [{}, {}) {} items, {} calls, {}",
                run.interval_start,
                run.interval_end,
                run.item_count,
                run.api_calls,
                run.status.to_db_string()
            );
            match &run.error_message {
                Some(message) => println!(" ({})", message),
                None => println!(),
            }
        }
    }
}
