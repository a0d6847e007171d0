use super::engine::{GroupView, Summary};
use super::formatter::{format_seconds, FormattedGroup};
use super::productivity::Elapsed;
use anyhow::Result;
use prettytable::{row, Table};

pub struct View {}

impl View {
    /// Prints groups as a table. Recently changed rows are marked with `*`, groups with
    /// time anomalies with `!`.
    pub fn groups(groups: &[GroupView]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row![
            "", "KEY", "RECORDS", "STATUS", "ACTIVE", "REMAINING", "INACTIVE", "ACTIVITY", "LAST ORDER", "LAST TASK", "STATION", "LAST START"
        ]);
        for group in groups.iter().map(FormattedGroup::from) {
            let marker = format!("{}{}", if group.changed { "*" } else { "" }, if group.issues { "!" } else { "" });
            table.add_row(row![
                marker,
                group.key,
                group.records,
                group.status,
                group.active,
                group.remaining,
                group.inactive,
                group.activity,
                group.last_order,
                group.last_task,
                group.last_workstation,
                group.last_start
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn summary(summary: &Summary) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TOTAL", "OPEN", "OPERATORS", "TASKS", "ORDERS"]);
        table.add_row(row![
            summary.total,
            summary.open,
            summary.unique_operators,
            summary.unique_tasks,
            summary.unique_orders
        ]);
        table.printstd();

        Ok(())
    }

    pub fn shift(elapsed: &Elapsed) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ELAPSED", "BREAK", "EFFECTIVE"]);
        table.add_row(row![
            format_seconds(elapsed.total),
            format_seconds(elapsed.break_overlap),
            format_seconds(elapsed.effective)
        ]);
        table.printstd();

        Ok(())
    }
}
