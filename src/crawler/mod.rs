//! Crawler module for complete interval retrieval
//!
//! This module contains the core crawling logic, including:
//! - Time-windowed pagination over an offset-less source
//! - Mapping trigger times to intervals and planning backfills
//! - Running crawls against the call budget and publishing their results

mod interval_crawler;
mod runner;
mod scheduler;

pub use interval_crawler::{validate_span, IntervalCrawler};
pub use runner::{IntervalReport, Runner};
pub use scheduler::{backfill_plan, interval_for};
