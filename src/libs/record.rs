//! Work-log record model.
//!
//! A [`WorkLogRecord`] is one shop-floor time entry as delivered by the backend:
//! who worked, on which task and order, when, and how many seconds were credited.
//! Records are owned by the backend; floorlog only reads and caches them.
//!
//! ## Identity
//!
//! A record is identified by the composite key `(orderSeries, orderNumber, lineNumber)`,
//! exposed as [`RecordKey`]. It is the only identity used for deduplication and diffing.
//!
//! ## Lenient Decoding
//!
//! Backend rows are decoded permissively:
//! - text fields accept strings or numbers, `null` means absent
//! - `dedicatedSeconds` accepts numbers or numeric strings, anything else is `0`
//! - `openFlag` accepts booleans, `0/1` and `"S"/"N"`-style strings
//! - unknown attributes are kept in [`WorkLogRecord::extra`] so equality covers them
//!
//! ## Open vs. Closed
//!
//! A record is closed once it has both an end date and a usable end time and its
//! open flag is not set. Everything else is open.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// End-time values the backend uses while an entry is still running.
const END_TIME_PLACEHOLDERS: [&str; 6] = ["", "-", "--:--", "null", "00:00", "00:00:00"];

/// Magnitude above which the legacy unit shim reads `dedicatedSeconds` as milliseconds.
const LEGACY_MILLIS_THRESHOLD: f64 = 1e9;

/// Composite identity of a work-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    pub series: String,
    pub number: String,
    pub line: String,
}

impl RecordKey {
    pub fn new(series: impl Into<String>, number: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            number: number.into(),
            line: line.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.series, self.number, self.line)
    }
}

/// One shop-floor time entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub order_series: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub line_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub operator_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub operator_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_code: Option<String>,
    /// Human-facing order number, distinct from the series/number/line identity.
    #[serde(default, deserialize_with = "lenient::text")]
    pub manual_order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub module_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub workstation_code: Option<String>,

    /// Main record date, used when no start date is present.
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub end_time: Option<String>,

    /// Seconds credited to this entry.
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub dedicated_seconds: f64,
    /// Explicit "still running" marker, independent of the end time.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub open_flag: bool,

    /// Attributes floorlog does not interpret, kept for equality checks.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WorkLogRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(
            self.order_series.clone().unwrap_or_default(),
            self.order_number.clone().unwrap_or_default(),
            self.line_number.clone().unwrap_or_default(),
        )
    }

    /// Returns `true` when the end time is missing, empty or a placeholder.
    pub fn has_open_time(&self) -> bool {
        match self.end_time.as_deref() {
            Some(end) => END_TIME_PLACEHOLDERS.contains(&end.trim()),
            None => true,
        }
    }

    pub fn has_end_date(&self) -> bool {
        self.end_date.as_deref().is_some_and(|d| !d.trim().is_empty())
    }

    /// Open if flagged as running or missing an end date or end time.
    pub fn is_open(&self) -> bool {
        self.open_flag || !self.has_end_date() || self.has_open_time()
    }

    /// Calendar day the entry belongs to: the start date, else the main date.
    pub fn day(&self) -> Option<NaiveDate> {
        self.start_date
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.date.as_deref().and_then(parse_date))
    }

    pub fn start_instant(&self) -> Option<NaiveDateTime> {
        let time = self.start_time.as_deref().and_then(parse_time)?;
        Some(self.day()?.and_time(time))
    }

    /// End instant of a closed entry. Falls back to the start day when no end date is set.
    pub fn end_instant(&self) -> Option<NaiveDateTime> {
        if self.has_open_time() {
            return None;
        }
        let time = self.end_time.as_deref().and_then(parse_time)?;
        let day = self.end_date.as_deref().and_then(parse_date).or_else(|| self.day())?;
        Some(day.and_time(time))
    }

    /// Sort timestamp in milliseconds.
    ///
    /// Prefers the start date and time, falls back to the main date and the end time.
    /// A record without a parseable date yields `0`, the oldest possible value.
    pub fn timestamp(&self) -> i64 {
        let Some(day) = self.day() else {
            return 0;
        };
        let time = self
            .start_time
            .as_deref()
            .and_then(parse_time)
            .or_else(|| self.end_time.as_deref().and_then(parse_time))
            .unwrap_or(NaiveTime::MIN);
        day.and_time(time).and_utc().timestamp_millis()
    }

    /// Reinterprets oversized `dedicatedSeconds` values as milliseconds.
    ///
    /// Compatibility shim for backends that report milliseconds; the documented unit is seconds.
    pub fn apply_legacy_millis(&mut self) {
        if self.dedicated_seconds > LEGACY_MILLIS_THRESHOLD {
            self.dedicated_seconds /= 1000.0;
        }
    }
}

/// Parses `YYYY-MM-DD`, ignoring any trailing time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parses `HH:MM` or `HH:MM:SS`; `HH:MM` is read as `HH:MM:00`.
///
/// Accepts a full `YYYY-MM-DDTHH:MM:SS` value and drops fractional seconds.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let mut value = value.trim();
    if let Some((_, time)) = value.split_once(['T', ' ']) {
        value = time;
    }
    let value = value.split('.').next().unwrap_or(value);
    let normalized = match value.matches(':').count() {
        1 => format!("{}:00", value),
        _ => value.to_string(),
    };
    NaiveTime::parse_from_str(&normalized, "%H:%M:%S").ok()
}

/// Permissive field decoders for backend rows.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let seconds = match value {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        Ok(if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "s" | "si" | "y" | "yes"),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numbers_as_text_and_defaults_missing_fields() {
        let record: WorkLogRecord = serde_json::from_value(json!({
            "orderSeries": "S1",
            "orderNumber": 100,
            "lineNumber": 1,
            "dedicatedSeconds": "125.5",
            "openFlag": "S",
            "shiftCode": "A"
        }))
        .unwrap();

        assert_eq!(record.key(), RecordKey::new("S1", "100", "1"));
        assert_eq!(record.dedicated_seconds, 125.5);
        assert!(record.open_flag);
        assert!(record.operator_code.is_none());
        assert_eq!(record.extra.get("shiftCode"), Some(&json!("A")));
    }

    #[test]
    fn garbage_seconds_become_zero() {
        let record: WorkLogRecord = serde_json::from_value(json!({ "dedicatedSeconds": "abc" })).unwrap();
        assert_eq!(record.dedicated_seconds, 0.0);

        let record: WorkLogRecord = serde_json::from_value(json!({ "dedicatedSeconds": -40 })).unwrap();
        assert_eq!(record.dedicated_seconds, 0.0);
    }

    #[test]
    fn time_without_seconds_is_normalized() {
        assert_eq!(parse_time("08:15"), NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(parse_time("08:15:30.250"), NaiveTime::from_hms_opt(8, 15, 30));
        assert_eq!(parse_time("2024-03-04T07:05:00"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_time("soon"), None);
    }

    #[test]
    fn timestamp_prefers_start_and_falls_back_to_date() {
        let record = WorkLogRecord {
            start_date: Some("2024-03-04".into()),
            start_time: Some("07:00".into()),
            ..Default::default()
        };
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(record.timestamp(), expected);

        let fallback = WorkLogRecord {
            date: Some("2024-03-04T00:00:00".into()),
            end_time: Some("07:00:00".into()),
            ..Default::default()
        };
        assert_eq!(fallback.timestamp(), expected);
    }

    #[test]
    fn record_without_date_has_zero_timestamp() {
        let record = WorkLogRecord {
            start_time: Some("07:00".into()),
            ..Default::default()
        };
        assert_eq!(record.timestamp(), 0);
    }

    #[test]
    fn open_and_closed_records() {
        let closed = WorkLogRecord {
            end_date: Some("2024-03-04".into()),
            end_time: Some("09:00".into()),
            ..Default::default()
        };
        assert!(!closed.is_open());

        let flagged = WorkLogRecord { open_flag: true, ..closed.clone() };
        assert!(flagged.is_open());
        assert!(!flagged.has_open_time());

        let placeholder = WorkLogRecord {
            end_time: Some("--:--".into()),
            ..closed
        };
        assert!(placeholder.has_open_time());
        assert!(placeholder.is_open());
    }

    #[test]
    fn legacy_millis_only_touches_oversized_values() {
        let mut record = WorkLogRecord {
            dedicated_seconds: 3_600_000_000.0,
            ..Default::default()
        };
        record.apply_legacy_millis();
        assert_eq!(record.dedicated_seconds, 3_600_000.0);

        record.apply_legacy_millis();
        assert_eq!(record.dedicated_seconds, 3_600_000.0);
    }
}
