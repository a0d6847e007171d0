//! Display formatting for aggregated groups.
//!
//! Durations are shown as `HH:MM:SS`; hours are not wrapped at 24 so a long accumulated
//! total stays readable. [`FormattedGroup`] pre-renders a [`GroupView`] into strings for
//! table output and file export.
//!
//! ```rust
//! use floorlog::libs::formatter::format_seconds;
//!
//! assert_eq!(format_seconds(0), "00:00:00");
//! assert_eq!(format_seconds(27_000), "07:30:00");
//! ```

use crate::libs::engine::GroupView;
use crate::libs::productivity::Status;
use serde::{Deserialize, Serialize};

/// A group rendered to display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedGroup {
    pub key: String,
    pub records: usize,
    pub status: String,
    pub active: String,
    pub remaining: String,
    pub inactive: String,
    pub activity: String,
    pub last_order: String,
    pub last_task: String,
    pub last_workstation: String,
    pub last_start: String,
    pub issues: bool,
    pub changed: bool,
}

impl From<&GroupView> for FormattedGroup {
    fn from(group: &GroupView) -> Self {
        let last = &group.last;
        let last_start = match (last.day(), last.start_time.as_deref()) {
            (Some(day), Some(time)) => format!("{} {}", day.format("%Y-%m-%d"), time),
            (Some(day), None) => day.format("%Y-%m-%d").to_string(),
            _ => "-".to_string(),
        };

        FormattedGroup {
            key: group.key.clone(),
            records: group.record_count,
            status: format_status(group.stats.status).to_string(),
            active: format_seconds(group.stats.active_seconds),
            remaining: format_seconds(group.stats.remaining_seconds),
            inactive: format_seconds(group.activity.inactive_seconds),
            activity: format!("{}%", group.activity.percent),
            last_order: or_dash(last.manual_order_number.as_deref()),
            last_task: or_dash(last.task_code.as_deref()),
            last_workstation: or_dash(last.workstation_code.as_deref()),
            last_start,
            issues: group.has_issues,
            changed: group.recently_changed,
        }
    }
}

/// Formats whole seconds as `HH:MM:SS`.
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

pub fn format_status(status: Status) -> &'static str {
    match status {
        Status::Partial => "partial",
        Status::Total => "total",
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "-".to_string(),
    }
}
