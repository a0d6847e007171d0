//! Integrity flags for work-log entries.
//!
//! Flags are a visibility signal only (a warning badge in the view); they never change
//! data and never block aggregation.

use crate::libs::config::ShiftConfig;
use crate::libs::productivity::overlap_seconds;
use crate::libs::record::WorkLogRecord;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeIssues {
    /// End time missing, empty or a placeholder.
    pub has_open_time: bool,
    /// The entry's interval intersects the break window.
    pub overlaps_break: bool,
}

impl TimeIssues {
    pub fn any(&self) -> bool {
        self.has_open_time || self.overlaps_break
    }
}

/// Flags a single record.
///
/// Open entries are measured up to `now`, but never past the shift's open cutoff
/// on the entry's own day. Entries without a parseable start never overlap the break.
pub fn detect_time_issues(record: &WorkLogRecord, now: NaiveDateTime, shift: &ShiftConfig) -> TimeIssues {
    let has_open_time = record.has_open_time();

    let overlaps_break = record.start_instant().is_some_and(|start| {
        let day = start.date();
        let end = if has_open_time {
            now.min(day.and_time(shift.open_cutoff))
        } else {
            record.end_instant().unwrap_or(start)
        };
        overlap_seconds(start, end, day.and_time(shift.break_start), day.and_time(shift.break_end)) > 0
    });

    TimeIssues {
        has_open_time,
        overlaps_break,
    }
}

/// `true` if any member raises either flag.
pub fn group_has_issues<'a, I>(records: I, now: NaiveDateTime, shift: &ShiftConfig) -> bool
where
    I: IntoIterator<Item = &'a WorkLogRecord>,
{
    records.into_iter().any(|record| detect_time_issues(record, now, shift).any())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(start: &str, end: Option<&str>) -> WorkLogRecord {
        WorkLogRecord {
            start_date: Some("2024-05-06".into()),
            start_time: Some(start.into()),
            end_date: end.map(|_| "2024-05-06".into()),
            end_time: end.map(Into::into),
            ..Default::default()
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn closed_entry_before_break_is_clean() {
        let issues = detect_time_issues(&entry("07:00", Some("09:00")), at(12, 0), &ShiftConfig::default());
        assert!(!issues.any());
    }

    #[test]
    fn closed_entry_across_break_overlaps() {
        let issues = detect_time_issues(&entry("09:00", Some("10:30")), at(12, 0), &ShiftConfig::default());
        assert!(issues.overlaps_break);
        assert!(!issues.has_open_time);
    }

    #[test]
    fn entry_touching_break_edge_does_not_overlap() {
        let issues = detect_time_issues(&entry("08:00", Some("09:30")), at(12, 0), &ShiftConfig::default());
        assert!(!issues.overlaps_break);
    }

    #[test]
    fn open_entry_is_measured_up_to_now() {
        let shift = ShiftConfig::default();
        let before_break = detect_time_issues(&entry("08:00", None), at(9, 0), &shift);
        assert!(before_break.has_open_time);
        assert!(!before_break.overlaps_break);

        let after_break = detect_time_issues(&entry("08:00", None), at(9, 45), &shift);
        assert!(after_break.overlaps_break);
    }

    #[test]
    fn open_entry_from_a_past_day_stops_at_cutoff() {
        let record = entry("10:30", None);
        let next_day = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let issues = detect_time_issues(&record, next_day, &ShiftConfig::default());
        assert!(issues.has_open_time);
        assert!(!issues.overlaps_break);
    }

    #[test]
    fn group_flags_when_any_member_has_issues() {
        let shift = ShiftConfig::default();
        let clean = entry("07:00", Some("08:00"));
        let open = entry("11:00", None);
        assert!(!group_has_issues([&clean], at(12, 0), &shift));
        assert!(group_has_issues([&clean, &open], at(12, 0), &shift));
    }
}
