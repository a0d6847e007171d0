//! Change detection between two snapshots.
//!
//! Only membership and value equality matter; the order in which records arrived does
//! not. Identical polls are the steady state, so [`diff`] proves equality first and only
//! builds the full key set when something actually moved.

use crate::libs::grouping::Dimension;
use crate::libs::record::RecordKey;
use crate::libs::snapshot::Snapshot;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changed: bool,
    /// Keys that were added, removed, or whose record differs.
    pub changed_keys: HashSet<RecordKey>,
}

/// `true` when both snapshots hold the same keys with equal records.
pub fn is_unchanged(old: &Snapshot, new: &Snapshot) -> bool {
    old.len() == new.len() && new.values().iter().all(|record| old.get(&record.key()) == Some(record))
}

pub fn diff(old: &Snapshot, new: &Snapshot) -> ChangeSet {
    if is_unchanged(old, new) {
        return ChangeSet::default();
    }

    let mut changed_keys: HashSet<RecordKey> = new
        .values()
        .iter()
        .filter(|record| old.get(&record.key()) != Some(*record))
        .map(|record| record.key())
        .collect();
    changed_keys.extend(old.keys().filter(|key| !new.contains_key(key)).cloned());

    ChangeSet {
        changed: !changed_keys.is_empty(),
        changed_keys,
    }
}

/// Group keys along `dimension` touched by `changes`.
///
/// A record that moved between groups marks both its old and its new group.
pub fn changed_groups(old: &Snapshot, new: &Snapshot, changes: &ChangeSet, dimension: Dimension) -> BTreeSet<String> {
    changes
        .changed_keys
        .iter()
        .flat_map(|key| [old.get(key), new.get(key)])
        .flatten()
        .map(|record| dimension.key_for(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::record::WorkLogRecord;

    fn record(line: &str, operator: &str, seconds: f64) -> WorkLogRecord {
        WorkLogRecord {
            order_series: Some("S1".into()),
            order_number: Some("100".into()),
            line_number: Some(line.into()),
            operator_code: Some(operator.into()),
            dedicated_seconds: seconds,
            ..Default::default()
        }
    }

    #[test]
    fn same_records_in_another_order_are_unchanged() {
        let old = Snapshot::replace(vec![record("1", "ana", 10.0), record("2", "luis", 20.0)]);
        let new = Snapshot::replace(vec![record("2", "luis", 20.0), record("1", "ana", 10.0)]);

        let changes = diff(&old, &new);
        assert!(!changes.changed);
        assert!(changes.changed_keys.is_empty());
    }

    #[test]
    fn additions_removals_and_edits_are_reported() {
        let old = Snapshot::replace(vec![record("1", "ana", 10.0), record("2", "luis", 20.0)]);
        let new = Snapshot::replace(vec![record("1", "ana", 15.0), record("3", "eva", 5.0)]);

        let changes = diff(&old, &new);
        assert!(changes.changed);
        let mut lines: Vec<_> = changes.changed_keys.iter().map(|k| k.line.as_str()).collect();
        lines.sort();
        assert_eq!(lines, vec!["1", "2", "3"]);
    }

    #[test]
    fn moved_record_marks_both_groups() {
        let old = Snapshot::replace(vec![record("1", "ana", 10.0), record("2", "luis", 20.0)]);
        let new = Snapshot::replace(vec![record("1", "eva", 10.0), record("2", "luis", 20.0)]);

        let changes = diff(&old, &new);
        let groups = changed_groups(&old, &new, &changes, Dimension::Operator);
        assert_eq!(groups.into_iter().collect::<Vec<_>>(), vec!["ANA".to_string(), "EVA".to_string()]);
    }

    #[test]
    fn unknown_attributes_take_part_in_equality() {
        let mut edited = record("1", "ana", 10.0);
        edited.extra.insert("note".into(), serde_json::json!("rework"));

        let old = Snapshot::replace(vec![record("1", "ana", 10.0)]);
        let new = Snapshot::replace(vec![edited]);
        assert!(diff(&old, &new).changed);
    }
}
