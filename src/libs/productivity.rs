//! Shift-aware time accounting.
//!
//! All figures are computed against a single fixed shift (see [`ShiftConfig`]):
//! it starts at 06:30 local time, lasts 7.5 hours, and contains an unpaid break
//! window from 09:30 to 10:00 that does not count as elapsed working time.
//!
//! ## Cached vs. Live Figures
//!
//! Group roll-ups are split in two:
//!
//! - [`Stats`] holds the accumulable part (`active_seconds`, `status`, `remaining_seconds`).
//!   It only depends on the records and is computed once per snapshot.
//! - [`Activity`] holds the part that depends on "now" (effective elapsed time,
//!   inactive time, percent activity). It is recomputed every time a view is built.
//!
//! ## Formulas
//!
//! ```text
//! total          = clamp(now - shift_start, 0, shift_duration)
//! break_overlap  = min(total, |[shift_start, now] ∩ [break_start, break_end]|)
//! effective      = total - break_overlap
//!
//! percent        = clamp(round(100 * active / effective), 0, 100), 0 if effective == 0
//! inactive       = max(0, effective - active)
//! ```

use crate::libs::config::ShiftConfig;
use crate::libs::record::WorkLogRecord;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::{max, min};

/// Elapsed shift time at a given instant, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Elapsed {
    pub total: u64,
    pub break_overlap: u64,
    pub effective: u64,
}

/// Completion state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// At least one member is still open.
    Partial,
    /// Every member is closed.
    Total,
}

/// Accumulable roll-up for a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub active_seconds: u64,
    pub status: Status,
    pub remaining_seconds: u64,
}

/// Time-dependent figures for a group, valid for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub elapsed: Elapsed,
    pub inactive_seconds: u64,
    pub percent: u8,
}

/// Length in seconds of the intersection of two intervals.
///
/// Returns `0` for disjoint or inverted intervals.
pub fn overlap_seconds(a_start: NaiveDateTime, a_end: NaiveDateTime, b_start: NaiveDateTime, b_end: NaiveDateTime) -> u64 {
    let seconds = (min(a_end, b_end) - max(a_start, b_start)).num_seconds();
    seconds.max(0) as u64
}

/// Computes elapsed shift time at `now`, excluding the break window.
///
/// The shift is anchored on the calendar day of `now`. The result never exceeds the
/// configured shift duration, however late `now` is.
pub fn compute_effective_elapsed(now: NaiveDateTime, shift: &ShiftConfig) -> Elapsed {
    let day = now.date();
    let shift_start = day.and_time(shift.start);

    let since_start = (now - shift_start).num_seconds().max(0) as u64;
    let total = since_start.min(shift.duration_secs);

    let break_overlap = overlap_seconds(shift_start, now, day.and_time(shift.break_start), day.and_time(shift.break_end)).min(total);

    Elapsed {
        total,
        break_overlap,
        effective: total.saturating_sub(break_overlap),
    }
}

/// Rolls up a set of records.
///
/// `active_seconds` is the floored sum of `dedicated_seconds`, the status is
/// [`Status::Partial`] as soon as one record is open.
pub fn compute_stats<'a, I>(records: I, shift: &ShiftConfig) -> Stats
where
    I: IntoIterator<Item = &'a WorkLogRecord>,
{
    let mut active = 0.0;
    let mut any_open = false;
    for record in records {
        if record.dedicated_seconds.is_finite() {
            active += record.dedicated_seconds.max(0.0);
        }
        any_open |= record.is_open();
    }

    let active_seconds = active.floor() as u64;
    Stats {
        active_seconds,
        status: if any_open { Status::Partial } else { Status::Total },
        remaining_seconds: shift.duration_secs.saturating_sub(active_seconds),
    }
}

/// Percentage of effective elapsed time covered by active time, clamped to `[0, 100]`.
pub fn percent_activity(active_seconds: u64, effective_elapsed: u64) -> u8 {
    if effective_elapsed == 0 {
        return 0;
    }
    let percent = (100.0 * active_seconds as f64 / effective_elapsed as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

pub fn inactive_seconds(active_seconds: u64, effective_elapsed: u64) -> u64 {
    effective_elapsed.saturating_sub(active_seconds)
}

/// Live figures for cached [`Stats`] at `now`.
pub fn activity(stats: &Stats, now: NaiveDateTime, shift: &ShiftConfig) -> Activity {
    let elapsed = compute_effective_elapsed(now, shift);
    Activity {
        elapsed,
        inactive_seconds: inactive_seconds(stats.active_seconds, elapsed.effective),
        percent: percent_activity(stats.active_seconds, elapsed.effective),
    }
}
