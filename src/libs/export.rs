//! Export of aggregated groups to files.
//!
//! Writes the groups of one dimension, together with the summary counts, as CSV, JSON
//! or Excel. Without an explicit output path the file is named
//! `floorlog_<dimension>_<timestamp>.<ext>` in the working directory.
//!
//! ```rust,no_run
//! use floorlog::libs::export::{ExportFormat, Exporter};
//! # use floorlog::libs::engine::AggregationState;
//! # use floorlog::libs::grouping::Dimension;
//! # let state = AggregationState::default();
//! # let date = chrono::Local::now().date_naive();
//!
//! let groups = state.groups_now(Dimension::Operator);
//! Exporter::new(ExportFormat::Csv, None, Dimension::Operator).export(&groups, &state.summary(), date)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::engine::{GroupView, Summary};
use crate::libs::formatter::FormattedGroup;
use crate::libs::grouping::Dimension;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADERS: [&str; 12] = [
    "Key",
    "Records",
    "Status",
    "Active",
    "Remaining",
    "Inactive",
    "Activity",
    "Last Order",
    "Last Task",
    "Workstation",
    "Last Start",
    "Issues",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values, one row per group.
    Csv,
    /// Pretty-printed JSON including the summary.
    Json,
    /// Excel workbook with a formatted header row.
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// JSON document layout.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub date: String,
    pub dimension: Dimension,
    pub summary: &'a Summary,
    pub groups: Vec<FormattedGroup>,
}

pub struct Exporter {
    format: ExportFormat,
    dimension: Dimension,
    output_path: PathBuf,
}

impl Exporter {
    pub fn new(format: ExportFormat, output_path: Option<PathBuf>, dimension: Dimension) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "floorlog_{}_{}.{}",
                dimension,
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });

        Self {
            format,
            dimension,
            output_path,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn export(&self, groups: &[GroupView], summary: &Summary, date: NaiveDate) -> Result<()> {
        let rows: Vec<FormattedGroup> = groups.iter().map(FormattedGroup::from).collect();
        match self.format {
            ExportFormat::Csv => self.export_csv(&rows),
            ExportFormat::Json => self.export_json(rows, summary, date),
            ExportFormat::Excel => self.export_excel(&rows, summary, date),
        }
    }

    fn export_csv(&self, rows: &[FormattedGroup]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(&self.output_path)?;
        wtr.write_record(HEADERS)?;
        for row in rows {
            wtr.write_record(cells(row))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn export_json(&self, groups: Vec<FormattedGroup>, summary: &Summary, date: NaiveDate) -> Result<()> {
        let document = ExportDocument {
            date: date.format("%Y-%m-%d").to_string(),
            dimension: self.dimension,
            summary,
            groups,
        };
        let json = serde_json::to_string_pretty(&document)?;
        File::create(&self.output_path)?.write_all(json.as_bytes())?;
        Ok(())
    }

    fn export_excel(&self, rows: &[FormattedGroup], summary: &Summary, date: NaiveDate) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let header_format = Format::new().set_bold().set_background_color(rust_xlsxwriter::Color::Gray);
        let title_format = Format::new().set_bold().set_font_size(14.0);

        worksheet.write_string_with_format(0, 0, format!("Work by {} - {}", self.dimension, date.format("%Y-%m-%d")), &title_format)?;

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(2, col as u16, *header, &header_format)?;
        }

        let mut row = 3;
        for group in rows {
            for (col, value) in cells(group).iter().enumerate() {
                if col == 1 {
                    worksheet.write_number(row, 1, group.records as f64)?;
                } else {
                    worksheet.write_string(row, col as u16, value)?;
                }
            }
            row += 1;
        }

        row += 1;
        worksheet.write_string_with_format(row, 0, "SUMMARY", &header_format)?;
        for (label, value) in [
            ("Total", summary.total),
            ("Open", summary.open),
            ("Operators", summary.unique_operators),
            ("Tasks", summary.unique_tasks),
            ("Orders", summary.unique_orders),
        ] {
            row += 1;
            worksheet.write_string(row, 0, label)?;
            worksheet.write_number(row, 1, value as f64)?;
        }

        worksheet.autofit();
        workbook.save(&self.output_path)?;
        Ok(())
    }
}

fn cells(group: &FormattedGroup) -> [String; 12] {
    [
        group.key.clone(),
        group.records.to_string(),
        group.status.clone(),
        group.active.clone(),
        group.remaining.clone(),
        group.inactive.clone(),
        group.activity.clone(),
        group.last_order.clone(),
        group.last_task.clone(),
        group.last_workstation.clone(),
        group.last_start.clone(),
        if group.issues { "yes".to_string() } else { "no".to_string() },
    ]
}
