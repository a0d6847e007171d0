use super::{load, parse_date};
use crate::{
    libs::{
        export::{ExportFormat, Exporter},
        grouping::Dimension,
        messages::Message,
    },
    msg_success, msg_warning,
};
use anyhow::Result;
use chrono::Local;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Grouping dimension to export
    #[arg(short, long, value_enum, default_value = "operator")]
    by: Dimension,

    /// Output format for the exported data
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Custom output file path
    ///
    /// Defaults to `floorlog_<dimension>_<timestamp>.<ext>` in the working directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Day to export: `today` or YYYY-MM-DD
    #[arg(short, long, default_value = "today")]
    date: String,
}

pub async fn cmd(args: ExportArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let state = load(date).await?;

    let groups = state.groups_now(args.by);
    if groups.is_empty() {
        msg_warning!(Message::ExportNoData);
        return Ok(());
    }

    let exporter = Exporter::new(args.format, args.output, args.by);
    exporter.export(&groups, &state.summary(), date.unwrap_or_else(|| Local::now().date_naive()))?;

    msg_success!(Message::ExportCompleted(exporter.output_path().display().to_string()));
    Ok(())
}
