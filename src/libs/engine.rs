//! Aggregation state container.
//!
//! [`AggregationState`] is the single owner of everything a poll cycle mutates: the
//! current snapshot, backend-provided counts, the date filter, and the transient
//! highlight table. The poll scheduler owns it and is the only writer; the view layer
//! reads it between cycles to build [`GroupView`]s.
//!
//! ## Apply Modes
//!
//! - [`ApplyMode::Diff`]: regular tick. The new payload is diffed against the current
//!   snapshot; the snapshot is replaced and groups are highlighted only if something changed.
//! - [`ApplyMode::Replace`]: first load or filter change. The snapshot is replaced
//!   unconditionally and nothing is highlighted.
//!
//! ## Highlights
//!
//! Changed groups stay marked for a fixed duration measured on the tokio clock. The mark
//! expires on its own; the next poll does not need to run to clear it.

use crate::api::{BackendStats, FetchError, PollPayload, PollQuery, WorkLogSource};
use crate::libs::anomaly::group_has_issues;
use crate::libs::config::{PollConfig, ShiftConfig};
use crate::libs::diff::{changed_groups, diff};
use crate::libs::grouping::{distinct_count, group_with_shift, Dimension};
use crate::libs::productivity::{activity, compute_effective_elapsed, Activity, Elapsed, Stats};
use crate::libs::record::WorkLogRecord;
use crate::libs::snapshot::Snapshot;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Diff,
    Replace,
}

/// What one applied payload did to the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub changed: bool,
    pub changed_records: usize,
    /// Group keys marked as recently changed, per dimension.
    pub changed_groups: HashMap<Dimension, BTreeSet<String>>,
}

/// Outbound view-model for one group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub dimension: Dimension,
    pub key: String,
    pub record_count: usize,
    pub last: WorkLogRecord,
    pub stats: Stats,
    pub activity: Activity,
    pub has_issues: bool,
    pub recently_changed: bool,
}

/// Totals and distinct counts for the current snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub open: u64,
    pub unique_operators: u64,
    pub unique_tasks: u64,
    pub unique_orders: u64,
    /// `true` when at least one figure came from the backend.
    pub from_backend: bool,
}

#[derive(Debug)]
pub struct AggregationState {
    snapshot: Snapshot,
    backend_stats: Option<BackendStats>,
    date_override: Option<NaiveDate>,
    filter_generation: u64,
    highlights: HashMap<(Dimension, String), Instant>,
    highlight_for: Duration,
    legacy_millis: bool,
    shift: ShiftConfig,
    loaded: bool,
    loading: bool,
    polls: u64,
    failures: u64,
    last_error: Option<String>,
}

impl Default for AggregationState {
    fn default() -> Self {
        Self::new(&PollConfig::default(), ShiftConfig::default())
    }
}

impl AggregationState {
    pub fn new(poll: &PollConfig, shift: ShiftConfig) -> Self {
        Self {
            snapshot: Snapshot::new(),
            backend_stats: None,
            date_override: None,
            filter_generation: 0,
            highlights: HashMap::new(),
            highlight_for: poll.highlight(),
            legacy_millis: poll.legacy_millis_heuristic,
            shift,
            loaded: false,
            loading: false,
            polls: 0,
            failures: 0,
            last_error: None,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn shift(&self) -> &ShiftConfig {
        &self.shift
    }

    pub fn date_override(&self) -> Option<NaiveDate> {
        self.date_override
    }

    pub fn filter_generation(&self) -> u64 {
        self.filter_generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Parameters the next fetch has to send.
    pub fn query(&self) -> PollQuery {
        PollQuery { date: self.date_override }
    }

    /// Changes the inspected day. Returns the new filter generation.
    ///
    /// Any change invalidates the cache: results of requests issued for an older
    /// generation are stale and must not be applied.
    pub fn set_date_override(&mut self, date: Option<NaiveDate>) -> u64 {
        if self.date_override != date {
            self.date_override = date;
            self.filter_generation += 1;
            self.highlights.clear();
        }
        self.filter_generation
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    /// Records a failed cycle. The snapshot is left untouched.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.failures += 1;
        self.last_error = Some(error.into());
    }

    pub fn apply(&mut self, payload: PollPayload, mode: ApplyMode, now: Instant) -> ApplyOutcome {
        let PollPayload { mut records, stats } = payload;
        if self.legacy_millis {
            records.iter_mut().for_each(WorkLogRecord::apply_legacy_millis);
        }

        self.loading = false;
        self.last_error = None;
        self.polls += 1;
        self.backend_stats = stats;
        let was_loaded = std::mem::replace(&mut self.loaded, true);

        let next = Snapshot::replace(records);
        let outcome = match mode {
            ApplyMode::Replace => {
                self.highlights.clear();
                ApplyOutcome {
                    changed: true,
                    changed_records: next.len(),
                    changed_groups: HashMap::new(),
                }
            }
            ApplyMode::Diff => {
                let changes = diff(&self.snapshot, &next);
                if !changes.changed {
                    return ApplyOutcome::default();
                }

                let mut groups = HashMap::new();
                if was_loaded {
                    for dimension in Dimension::ALL {
                        let keys = changed_groups(&self.snapshot, &next, &changes, dimension);
                        for key in &keys {
                            self.highlights.insert((dimension, key.clone()), now + self.highlight_for);
                        }
                        groups.insert(dimension, keys);
                    }
                }
                ApplyOutcome {
                    changed: true,
                    changed_records: changes.changed_keys.len(),
                    changed_groups: groups,
                }
            }
        };

        self.snapshot = next;
        self.highlights.retain(|_, expires| *expires > now);
        outcome
    }

    /// Fetches once for the current filter and replaces the snapshot.
    ///
    /// Used by one-shot commands that do not run the scheduler.
    pub async fn refresh<S: WorkLogSource>(&mut self, source: &S) -> Result<ApplyOutcome, FetchError> {
        self.mark_loading();
        match source.fetch(self.query()).await {
            Ok(payload) => Ok(self.apply(payload, ApplyMode::Replace, Instant::now())),
            Err(error) => {
                self.record_failure(error.to_string());
                Err(error)
            }
        }
    }

    pub fn is_recently_changed(&self, dimension: Dimension, key: &str, now: Instant) -> bool {
        self.highlights
            .get(&(dimension, key.to_string()))
            .is_some_and(|expires| *expires > now)
    }

    /// Instant used for time accounting.
    ///
    /// When a past day is inspected the whole shift has elapsed, so the end of that day
    /// is used instead of the wall clock. A future day has not started yet and maps to its
    /// midnight, before the shift.
    pub fn reference_time(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.date_override {
            Some(date) if date < now.date() => date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)),
            Some(date) if date > now.date() => date.and_time(NaiveTime::MIN),
            _ => now,
        }
    }

    /// Builds the ordered group view-models for `dimension`.
    pub fn groups(&self, dimension: Dimension, now_local: NaiveDateTime, now: Instant) -> Vec<GroupView> {
        let reference = self.reference_time(now_local);
        group_with_shift(&self.snapshot, dimension, &self.shift)
            .into_iter()
            .map(|group| GroupView {
                dimension,
                record_count: group.record_count(),
                last: group.last.clone(),
                stats: group.stats,
                activity: activity(&group.stats, reference, &self.shift),
                has_issues: group_has_issues(group.records.iter().copied(), reference, &self.shift),
                recently_changed: self.is_recently_changed(dimension, &group.key, now),
                key: group.key,
            })
            .collect()
    }

    /// Shift time elapsed at `now_local`, honouring the date override.
    pub fn elapsed(&self, now_local: NaiveDateTime) -> Elapsed {
        compute_effective_elapsed(self.reference_time(now_local), &self.shift)
    }

    /// Convenience wrapper over [`Self::groups`] using the local wall clock.
    pub fn groups_now(&self, dimension: Dimension) -> Vec<GroupView> {
        self.groups(dimension, Local::now().naive_local(), Instant::now())
    }

    /// Totals and distinct counts, preferring backend figures field by field.
    pub fn summary(&self) -> Summary {
        let stats = self.backend_stats.clone().unwrap_or_default();
        let from_backend = [stats.total, stats.abiertas, stats.operadores_unicos, stats.tareas_unicas, stats.pedidos_unicos]
            .iter()
            .any(Option::is_some);

        let local_open = || self.snapshot.values().iter().filter(|r| r.is_open()).count() as u64;
        let local_distinct = |dimension| distinct_count(&self.snapshot, dimension) as u64;

        Summary {
            total: stats.total.unwrap_or(self.snapshot.len() as u64),
            open: stats.abiertas.unwrap_or_else(local_open),
            unique_operators: stats.operadores_unicos.unwrap_or_else(|| local_distinct(Dimension::Operator)),
            unique_tasks: stats.tareas_unicas.unwrap_or_else(|| local_distinct(Dimension::Task)),
            unique_orders: stats.pedidos_unicos.unwrap_or_else(|| local_distinct(Dimension::Order)),
            from_backend,
        }
    }
}
