//! newsapi-crawl main entry point
//!
//! This is the command-line interface for the NewsAPI interval crawler.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use newsapi_crawl::config::{load_config_with_hash, Config};
use newsapi_crawl::crawler::{backfill_plan, interval_for, Runner};
use newsapi_crawl::discovery::{
    domains_of, load_sources, replace_sources, update_sources, DomainDiscovery,
};
use newsapi_crawl::model::timestamp;
use newsapi_crawl::NewsApiClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// newsapi-crawl: complete, time-windowed retrieval from NewsAPI
///
/// Crawls every article published in the interval a trigger time is
/// responsible for, writes it to a partitioned JSON-lines store and indexes
/// it in SQLite.
#[derive(Parser, Debug)]
#[command(name = "newsapi-crawl")]
#[command(version)]
#[command(about = "Complete, time-windowed retrieval from NewsAPI", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Nominal trigger time (RFC 3339 or YYYY-MM-DDTHH:MM:SS, UTC); defaults to now
    #[arg(long, value_parser = parse_instant, conflicts_with = "backfill_from")]
    at: Option<DateTime<Utc>>,

    /// Start of a backfill range
    #[arg(long, value_parser = parse_instant, requires = "backfill_to")]
    backfill_from: Option<DateTime<Utc>>,

    /// End of a backfill range (exclusive)
    #[arg(long, value_parser = parse_instant, requires = "backfill_from")]
    backfill_to: Option<DateTime<Utc>>,

    /// Discover source domains from top headlines and update the sources file
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    discover: bool,

    /// Replace the sources file instead of merging into it
    #[arg(long, requires = "discover")]
    fresh_sources: bool,

    /// Validate config and show what would be crawled without calling the API
    #[arg(long, conflicts_with_all = ["stats", "discover"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "discover"])]
    stats: bool,
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    timestamp::parse(value).ok_or_else(|| format!("invalid timestamp: {}", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.discover {
        handle_discover(&config, cli.fresh_sources).await?;
    } else if let (Some(from), Some(to)) = (cli.backfill_from, cli.backfill_to) {
        handle_backfill(&config, &config_hash, from, to).await?;
    } else {
        handle_crawl(&config, &config_hash, cli.at.unwrap_or_else(Utc::now)).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("newsapi_crawl=info,warn"),
            1 => EnvFilter::new("newsapi_crawl=debug,info"),
            2 => EnvFilter::new("newsapi_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    println!("=== newsapi-crawl Dry Run ===\n");

    println!("Upstream:");
    println!("  Base URL: {}", config.newsapi.base_url);
    println!("  Page size: {}", config.newsapi.page_size);
    println!("  Daily call budget: {}", config.newsapi.daily_call_budget);
    println!(
        "  API key: {}",
        if config.newsapi.resolve_api_key().is_ok() {
            "set"
        } else {
            "missing"
        }
    );

    println!("\nWindow:");
    println!("  Size: {}s", config.window.size_seconds);
    println!("  Offset: {}s", config.window.offset_seconds);
    println!("  Aligned: {}", config.window.align);

    println!("\nCrawl:");
    println!("  On empty: {:?}", config.crawl.on_empty);
    println!("  Max concurrent crawls: {}", config.crawl.max_concurrent_crawls);
    println!("  Timeout: {}s", config.crawl.crawl_timeout_seconds);

    let filters = config.filters()?;
    println!("\nFilters:");
    for (key, value) in filters.to_query_pairs() {
        println!("  {} = {}", key, value);
    }
    if filters.domains().is_empty() {
        let sources = load_sources(Path::new(&config.discovery.sources_path))?;
        println!(
            "  domains = {} from {}",
            domains_of(&sources).len(),
            config.discovery.sources_path
        );
    }

    println!("\nOutput:");
    println!("  Directory: {}/{}", config.output.directory, config.output.prefix);
    println!("  Database: {}", config.output.database_path);

    let plan = match (cli.backfill_from, cli.backfill_to) {
        (Some(from), Some(to)) => backfill_plan(from, to, &config.window)?,
        _ => vec![interval_for(cli.at.unwrap_or_else(Utc::now), &config.window)?],
    };

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} interval(s):", plan.len());
    for interval in &plan {
        println!("  - {}", interval);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use newsapi_crawl::output::{load_statistics, print_statistics};
    use newsapi_crawl::storage::SqliteStore;

    println!("Database: {}\n", config.output.database_path);

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats, config.newsapi.daily_call_budget);

    Ok(())
}

/// Handles the --discover mode: refreshes the sources file
async fn handle_discover(config: &Config, fresh: bool) -> anyhow::Result<()> {
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi)?);
    let discovery = DomainDiscovery::from_config(client, &config.discovery);

    let discovered = discovery
        .discover_domains(&config.discovery.categories)
        .await
        .context("Source discovery failed")?;

    let path = Path::new(&config.discovery.sources_path);
    let sources = if fresh {
        replace_sources(path, &discovered)?
    } else {
        update_sources(path, &discovered)?
    };

    println!(
        "✓ {} sources ({} domains) in {}",
        sources.len(),
        domains_of(&sources).len(),
        path.display()
    );
    Ok(())
}

/// Handles a backfill between two instants
async fn handle_backfill(
    config: &Config,
    config_hash: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<()> {
    let plan = backfill_plan(from, to, &config.window)?;
    let runner = build_runner(config, config_hash)?;

    let results = runner.backfill(plan).await;
    let total = results.len();
    let mut failed = 0;

    for (interval, outcome) in &results {
        match outcome {
            Ok(report) => tracing::info!(
                "{}: {} items in {} calls",
                interval,
                report.item_count,
                report.api_calls
            ),
            Err(e) => {
                failed += 1;
                tracing::error!("{}: {}", interval, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} intervals failed", failed, total);
    }
    tracing::info!("Backfill of {} intervals completed", total);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    nominal: DateTime<Utc>,
) -> anyhow::Result<()> {
    let runner = build_runner(config, config_hash)?;

    match runner.run_at(nominal).await {
        Ok(report) => {
            tracing::info!(
                "Crawl of {} completed: {} items in {} calls",
                report.interval,
                report.item_count,
                report.api_calls
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn build_runner(config: &Config, config_hash: &str) -> anyhow::Result<Runner> {
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi)?);
    Ok(Runner::from_config(config, client, config_hash)?)
}
