//! Command-line interface for floorlog.
//!
//! Every subcommand lives in its own module with an `Args` struct and a `cmd` entry point.
//! One-shot commands (`groups`, `summary`, `export`) fetch once and exit; `watch` runs the
//! poll scheduler until interrupted.

pub mod export;
pub mod groups;
pub mod init;
pub mod summary;
pub mod watch;

use crate::api::WorkLogClient;
use crate::libs::config::Config;
use crate::libs::engine::AggregationState;
use crate::libs::messages::Message;
use crate::msg_error_anyhow;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Poll the work-log backend and show live groups")]
    Watch(watch::WatchArgs),
    #[command(about = "Show groups for one dimension")]
    Groups(groups::GroupsArgs),
    #[command(about = "Show totals and distinct counts")]
    Summary(summary::SummaryArgs),
    #[command(about = "Export groups to CSV, JSON or Excel")]
    Export(export::ExportArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Watch(args) => watch::cmd(args).await,
            Commands::Groups(args) => groups::cmd(args).await,
            Commands::Summary(args) => summary::cmd(args).await,
            Commands::Export(args) => export::cmd(args).await,
        }
    }
}

/// Parses a `--date` argument. `today` means no override.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    if value.trim().eq_ignore_ascii_case("today") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| msg_error_anyhow!(Message::InvalidDateFormat(value.to_string())))
}

/// Day shown in headers for a date override.
pub fn display_date(date: Option<NaiveDate>) -> String {
    date.unwrap_or_else(|| Local::now().date_naive()).format("%Y-%m-%d").to_string()
}

/// Fetches once for `date` and returns the populated state.
async fn load(date: Option<NaiveDate>) -> Result<AggregationState> {
    let config = Config::read()?.with_env_overrides();
    let client = WorkLogClient::new(config.require_server()?);
    let mut state = AggregationState::new(&config.poll.clone().unwrap_or_default(), config.shift.clone().unwrap_or_default());
    state.set_date_override(date);
    state
        .refresh(&client)
        .await
        .map_err(|e| msg_error_anyhow!(Message::FetchFailed(e.to_string())))?;
    Ok(state)
}
