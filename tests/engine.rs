#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use floorlog::api::PollPayload;
    use floorlog::libs::config::{PollConfig, ShiftConfig};
    use floorlog::libs::engine::{AggregationState, ApplyMode};
    use floorlog::libs::grouping::Dimension;
    use floorlog::libs::productivity::Status;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::Instant;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn payload(value: Value) -> PollPayload {
        PollPayload::from_value(value).unwrap()
    }

    fn morning() -> Value {
        json!([
            {
                "orderSeries": "S1", "orderNumber": 100, "lineNumber": 1,
                "operatorCode": "jp", "operatorDisplayName": "Juan Perez",
                "taskCode": "CUT", "manualOrderNumber": "P-1",
                "startDate": "2024-05-06", "startTime": "07:00",
                "endDate": "2024-05-06", "endTime": "08:00:00",
                "dedicatedSeconds": 3600
            },
            {
                "orderSeries": "S1", "orderNumber": 100, "lineNumber": 2,
                "operatorCode": "ana",
                "taskCode": "WELD", "manualOrderNumber": "P-1",
                "startDate": "2024-05-06", "startTime": "09:00",
                "endTime": null,
                "dedicatedSeconds": 1800.5
            },
            {
                "orderSeries": "S2", "orderNumber": 7, "lineNumber": 1,
                "operatorCode": "JUAN/2",
                "taskCode": "CUT",
                "startDate": "2024-05-06", "startTime": "10:30",
                "endDate": "2024-05-06", "endTime": "11:00",
                "dedicatedSeconds": "1800"
            }
        ])
    }

    fn loaded() -> AggregationState {
        let mut state = AggregationState::default();
        state.apply(payload(morning()), ApplyMode::Replace, Instant::now());
        state
    }

    #[test]
    fn test_operator_groups_merge_name_and_code_variants() {
        let state = loaded();
        let groups = state.groups(Dimension::Operator, at(11, 0), Instant::now());

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["ANA", "JUAN"]);

        let juan = &groups[1];
        assert_eq!(juan.record_count, 2);
        assert_eq!(juan.stats.active_seconds, 5400);
        assert_eq!(juan.stats.status, Status::Total);
        assert_eq!(juan.stats.remaining_seconds, 27_000 - 5400);
        assert_eq!(juan.last.order_series.as_deref(), Some("S2"));
        assert!(!juan.has_issues);
    }

    #[test]
    fn test_open_record_makes_group_partial_and_flagged() {
        let state = loaded();
        let groups = state.groups(Dimension::Operator, at(11, 0), Instant::now());

        let ana = &groups[0];
        assert_eq!(ana.stats.status, Status::Partial);
        assert_eq!(ana.stats.active_seconds, 1800);
        assert!(ana.has_issues);
    }

    #[test]
    fn test_activity_is_measured_against_effective_shift_time() {
        let state = loaded();
        let groups = state.groups(Dimension::Task, at(10, 15), Instant::now());

        let cut = groups.iter().find(|g| g.key == "CUT").unwrap();
        assert_eq!(cut.activity.elapsed.total, 13_500);
        assert_eq!(cut.activity.elapsed.break_overlap, 1800);
        assert_eq!(cut.activity.elapsed.effective, 11_700);
        assert_eq!(cut.activity.inactive_seconds, 11_700 - 5400);
        assert_eq!(cut.activity.percent, 46);
    }

    #[test]
    fn test_order_dimension_uses_sentinel_for_missing_manual_order() {
        let state = loaded();
        let keys: Vec<String> = state
            .groups(Dimension::Order, at(11, 0), Instant::now())
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["P-1".to_string(), "SIN_PEDIDO".to_string()]);
    }

    #[test]
    fn test_identical_polls_report_unchanged_and_do_not_highlight() {
        let mut state = AggregationState::default();
        let now = Instant::now();

        assert!(state.apply(payload(morning()), ApplyMode::Diff, now).changed);
        for _ in 0..2 {
            let outcome = state.apply(payload(morning()), ApplyMode::Diff, now);
            assert!(!outcome.changed);
            assert!(outcome.changed_groups.is_empty());
        }
        assert!(state
            .groups(Dimension::Operator, at(11, 0), now)
            .iter()
            .all(|g| !g.recently_changed));
    }

    #[test]
    fn test_reordered_payload_is_unchanged() {
        let mut state = loaded();
        let mut rows = morning().as_array().unwrap().clone();
        rows.reverse();

        let outcome = state.apply(payload(Value::Array(rows)), ApplyMode::Diff, Instant::now());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_changed_record_highlights_its_groups_then_expires() {
        let mut state = loaded();
        let mut rows = morning();
        rows[1]["dedicatedSeconds"] = json!(2400);

        let now = Instant::now();
        let outcome = state.apply(payload(rows), ApplyMode::Diff, now);
        assert!(outcome.changed);
        assert_eq!(outcome.changed_records, 1);
        assert!(outcome.changed_groups[&Dimension::Operator].contains("ANA"));
        assert!(outcome.changed_groups[&Dimension::Task].contains("WELD"));

        assert!(state.is_recently_changed(Dimension::Operator, "ANA", now));
        assert!(!state.is_recently_changed(Dimension::Operator, "JUAN", now));
        assert!(!state.is_recently_changed(Dimension::Operator, "ANA", now + Duration::from_millis(1000)));
    }

    #[test]
    fn test_record_moving_between_groups_marks_both() {
        let mut state = loaded();
        let mut rows = morning();
        rows[1]["operatorCode"] = json!("pedro");

        let outcome = state.apply(payload(rows), ApplyMode::Diff, Instant::now());
        let operators = &outcome.changed_groups[&Dimension::Operator];
        assert!(operators.contains("ANA"));
        assert!(operators.contains("PEDRO"));
    }

    #[test]
    fn test_deleted_record_is_a_change() {
        let mut state = loaded();
        let mut rows = morning().as_array().unwrap().clone();
        rows.pop();

        let outcome = state.apply(payload(Value::Array(rows)), ApplyMode::Diff, Instant::now());
        assert!(outcome.changed);
        assert!(outcome.changed_groups[&Dimension::Operator].contains("JUAN"));
        assert_eq!(state.snapshot().len(), 2);
    }

    #[test]
    fn test_replace_never_highlights() {
        let mut state = loaded();
        let mut rows = morning();
        rows[0]["dedicatedSeconds"] = json!(4000);

        let now = Instant::now();
        let outcome = state.apply(payload(rows), ApplyMode::Replace, now);
        assert!(outcome.changed);
        assert!(outcome.changed_groups.is_empty());
        assert!(!state.is_recently_changed(Dimension::Operator, "JUAN", now));
    }

    #[test]
    fn test_duplicate_keys_keep_the_later_record() {
        let mut state = AggregationState::default();
        state.apply(
            payload(json!([
                { "orderSeries": "S1", "orderNumber": 100, "lineNumber": 1, "endTime": "08:00" },
                { "orderSeries": "S1", "orderNumber": 100, "lineNumber": 1, "endTime": "09:00" }
            ])),
            ApplyMode::Replace,
            Instant::now(),
        );

        assert_eq!(state.snapshot().len(), 1);
        assert_eq!(state.snapshot().values()[0].end_time.as_deref(), Some("09:00"));
    }

    #[test]
    fn test_summary_prefers_backend_counts_per_field() {
        let mut state = AggregationState::default();
        let mut envelope = json!({ "data": morning(), "stats": { "total": 40, "operadoresUnicos": 12 } });
        state.apply(payload(envelope.take()), ApplyMode::Replace, Instant::now());

        let summary = state.summary();
        assert!(summary.from_backend);
        assert_eq!(summary.total, 40);
        assert_eq!(summary.unique_operators, 12);
        assert_eq!(summary.unique_tasks, 2);
        assert_eq!(summary.unique_orders, 2);
        assert_eq!(summary.open, 1);
    }

    #[test]
    fn test_summary_falls_back_to_local_counts() {
        let summary = loaded().summary();
        assert!(!summary.from_backend);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.unique_operators, 2);
        assert_eq!(summary.unique_tasks, 2);
        assert_eq!(summary.unique_orders, 2);
    }

    #[test]
    fn test_failure_keeps_stale_snapshot() {
        let mut state = loaded();
        state.mark_loading();
        state.record_failure("backend answered with status 502");

        assert_eq!(state.snapshot().len(), 3);
        assert!(!state.is_loading());
        assert_eq!(state.last_error(), Some("backend answered with status 502"));
    }

    #[test]
    fn test_past_date_override_accounts_full_shift() {
        let mut state = loaded();
        state.set_date_override(NaiveDate::from_ymd_opt(2024, 5, 6));

        let next_day = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap().and_hms_opt(7, 0, 0).unwrap();
        let groups = state.groups(Dimension::Operator, next_day, Instant::now());
        assert!(groups.iter().all(|g| g.activity.elapsed.total == 27_000));
    }

    #[test]
    fn test_legacy_millis_only_when_enabled() {
        let rows = json!([{ "orderSeries": "S1", "orderNumber": 1, "lineNumber": 1, "dedicatedSeconds": 5_400_000_000u64 }]);

        let mut plain = AggregationState::default();
        plain.apply(payload(rows.clone()), ApplyMode::Replace, Instant::now());
        assert_eq!(plain.snapshot().values()[0].dedicated_seconds, 5_400_000_000.0);

        let poll = PollConfig {
            legacy_millis_heuristic: true,
            ..Default::default()
        };
        let mut legacy = AggregationState::new(&poll, ShiftConfig::default());
        legacy.apply(payload(rows), ApplyMode::Replace, Instant::now());
        assert_eq!(legacy.snapshot().values()[0].dedicated_seconds, 5_400_000.0);
    }
}
