//! # Floorlog - live shop-floor work-log aggregation
//!
//! Polls a manufacturing work-log backend, keeps the latest snapshot of time entries,
//! detects what changed between polls, and groups entries by operator, task or order
//! with per-group time accounting against a fixed shift.
//!
//! ## Features
//!
//! - **Snapshot & Diff**: keyed snapshot store with a cheap "nothing changed" path
//! - **Grouping**: deterministic, sorted groups with sentinel buckets for missing keys
//! - **Time Accounting**: elapsed/effective shift time, remaining and inactive time, activity %
//! - **Anomalies**: open entries and entries overlapping the unpaid break
//! - **Adaptive Polling**: foreground/background intervals, last-request-wins ordering
//! - **Data Export**: CSV, JSON and Excel
//!
//! ## Usage
//!
//! ```rust,no_run
//! use floorlog::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod libs;
