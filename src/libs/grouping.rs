//! Grouping engine.
//!
//! Projects a [`Snapshot`] into groups along one [`Dimension`]. Each dimension has
//! exactly one key-derivation rule; those rules define which records count as "the same"
//! for aggregation:
//!
//! | Dimension  | Source field                                   | Sentinel        |
//! |------------|------------------------------------------------|-----------------|
//! | `operator` | display name, else operator code (first token) | `SIN_OPERARIO`  |
//! | `task`     | task code                                      | `SIN_TAREA`     |
//! | `order`    | manual order number                            | `SIN_PEDIDO`    |
//!
//! Groups come back sorted by key with plain string ordering, so consumers can diff
//! rows by position.

use crate::libs::config::ShiftConfig;
use crate::libs::productivity::{compute_stats, Stats};
use crate::libs::record::WorkLogRecord;
use crate::libs::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const NO_OPERATOR: &str = "SIN_OPERARIO";
pub const NO_TASK: &str = "SIN_TAREA";
pub const NO_ORDER: &str = "SIN_PEDIDO";

/// Axis along which records are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Operator,
    Task,
    Order,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Operator, Dimension::Task, Dimension::Order];

    /// Group key of `record` along this dimension.
    pub fn key_for(&self, record: &WorkLogRecord) -> String {
        let key = match self {
            Dimension::Operator => operator_token(record),
            Dimension::Task => present(record.task_code.as_deref()).map(str::to_string),
            Dimension::Order => present(record.manual_order_number.as_deref()).map(str::to_string),
        };
        key.unwrap_or_else(|| self.sentinel().to_string())
    }

    /// Bucket for records with no usable source value.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Dimension::Operator => NO_OPERATOR,
            Dimension::Task => NO_TASK,
            Dimension::Order => NO_ORDER,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Dimension::Operator => "operator",
            Dimension::Task => "task",
            Dimension::Order => "order",
        };
        write!(f, "{}", name)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// Display name wins over code; only the first whitespace- or slash-separated token counts.
fn operator_token(record: &WorkLogRecord) -> Option<String> {
    let source = present(record.operator_display_name.as_deref()).or(record.operator_code.as_deref())?;
    let token = source.trim().split(|c: char| c.is_whitespace() || c == '/').next()?;
    (!token.is_empty()).then(|| token.to_uppercase())
}

/// Records sharing one key along one dimension.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub dimension: Dimension,
    pub key: String,
    pub records: Vec<&'a WorkLogRecord>,
    /// Member with the greatest timestamp; the first one seen wins ties.
    pub last: &'a WorkLogRecord,
    pub stats: Stats,
}

impl Group<'_> {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Groups a snapshot using the default shift.
pub fn group(snapshot: &Snapshot, dimension: Dimension) -> Vec<Group<'_>> {
    group_with_shift(snapshot, dimension, &ShiftConfig::default())
}

pub fn group_with_shift<'a>(snapshot: &'a Snapshot, dimension: Dimension, shift: &ShiftConfig) -> Vec<Group<'a>> {
    let mut buckets: BTreeMap<String, Vec<&'a WorkLogRecord>> = BTreeMap::new();
    for record in snapshot.values() {
        buckets.entry(dimension.key_for(record)).or_default().push(record);
    }

    buckets
        .into_iter()
        .filter_map(|(key, records)| {
            let last = latest(&records)?;
            let stats = compute_stats(records.iter().copied(), shift);
            Some(Group {
                dimension,
                key,
                records,
                last,
                stats,
            })
        })
        .collect()
}

fn latest<'a>(records: &[&'a WorkLogRecord]) -> Option<&'a WorkLogRecord> {
    let mut iter = records.iter().copied();
    let mut best = iter.next()?;
    let mut best_ts = best.timestamp();
    for record in iter {
        let ts = record.timestamp();
        if ts > best_ts {
            best = record;
            best_ts = ts;
        }
    }
    Some(best)
}

/// Number of distinct keys along `dimension`.
pub fn distinct_count(snapshot: &Snapshot, dimension: Dimension) -> usize {
    let mut keys: Vec<String> = snapshot.values().iter().map(|r| dimension.key_for(r)).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_operator(display: Option<&str>, code: Option<&str>) -> String {
        let record = WorkLogRecord {
            operator_display_name: display.map(Into::into),
            operator_code: code.map(Into::into),
            ..Default::default()
        };
        Dimension::Operator.key_for(&record)
    }

    #[test]
    fn operator_key_takes_first_token_upper_cased() {
        assert_eq!(by_operator(Some("  juan perez "), Some("J01")), "JUAN");
        assert_eq!(by_operator(Some("ana/turno2"), None), "ANA");
        assert_eq!(by_operator(None, Some("op7 extra")), "OP7");
        assert_eq!(by_operator(Some("   "), Some("luis")), "LUIS");
    }

    #[test]
    fn operator_key_falls_back_to_sentinel() {
        assert_eq!(by_operator(None, None), NO_OPERATOR);
        assert_eq!(by_operator(None, Some("")), NO_OPERATOR);
        assert_eq!(by_operator(Some("/x"), None), NO_OPERATOR);
    }

    #[test]
    fn task_and_order_keep_raw_text() {
        let record = WorkLogRecord {
            task_code: Some("corte".into()),
            manual_order_number: Some("P-77".into()),
            ..Default::default()
        };
        assert_eq!(Dimension::Task.key_for(&record), "corte");
        assert_eq!(Dimension::Order.key_for(&record), "P-77");
    }

    #[test]
    fn last_prefers_latest_and_first_on_ties() {
        let make = |line: &str, time: &str| WorkLogRecord {
            order_series: Some("S".into()),
            order_number: Some("1".into()),
            line_number: Some(line.into()),
            operator_code: Some("ana".into()),
            start_date: Some("2024-05-06".into()),
            start_time: Some(time.into()),
            ..Default::default()
        };
        let snapshot = Snapshot::replace(vec![make("1", "08:00"), make("2", "09:00"), make("3", "09:00")]);
        let groups = group(&snapshot, Dimension::Operator);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].last.line_number.as_deref(), Some("2"));
        assert_eq!(groups[0].record_count(), 3);
    }

    #[test]
    fn distinct_count_includes_sentinel_bucket() {
        let snapshot = Snapshot::replace(vec![
            WorkLogRecord {
                line_number: Some("1".into()),
                task_code: Some("T1".into()),
                ..Default::default()
            },
            WorkLogRecord {
                line_number: Some("2".into()),
                ..Default::default()
            },
            WorkLogRecord {
                line_number: Some("3".into()),
                task_code: Some("T1".into()),
                ..Default::default()
            },
        ]);
        assert_eq!(distinct_count(&snapshot, Dimension::Task), 2);
    }
}
