//! Backend access for work-log polling.
//!
//! The engine consumes the backend through the [`WorkLogSource`] trait and never sees
//! HTTP details. [`worklog::WorkLogClient`] is the reqwest-based implementation; tests
//! and embedders can provide their own source.
//!
//! ## Payload Shapes
//!
//! The polling endpoint answers with either a bare array of records:
//!
//! ```json
//! [ { "orderSeries": "S1", "orderNumber": 100, "lineNumber": 1, ... } ]
//! ```
//!
//! or an envelope carrying optional backend-computed counts:
//!
//! ```json
//! { "data": [ ... ], "stats": { "total": 40, "abiertas": 3, "operadoresUnicos": 12 } }
//! ```
//!
//! Anything else is a [`FetchError::MalformedPayload`].

use crate::libs::record::WorkLogRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

pub mod worklog;

pub use worklog::WorkLogClient;

/// Query-string key for inspecting a day other than today.
pub const DATE_PARAM: &str = "fecha";

/// Why a poll produced no usable payload.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend answered with status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response has no recognizable record list")]
    MalformedPayload,

    #[error("no response within {0} seconds")]
    Timeout(u64),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Transport(error.to_string())
    }
}

/// Parameters of one poll request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollQuery {
    /// Day to inspect instead of today, sent verbatim as `fecha=YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
}

impl PollQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        self.date
            .map(|date| vec![(DATE_PARAM, date.format("%Y-%m-%d").to_string())])
            .unwrap_or_default()
    }
}

/// Backend-computed counts that may accompany a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStats {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub abiertas: Option<u64>,
    #[serde(default)]
    pub operadores_unicos: Option<u64>,
    #[serde(default)]
    pub tareas_unicas: Option<u64>,
    #[serde(default)]
    pub pedidos_unicos: Option<u64>,
}

/// Decoded poll response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollPayload {
    pub records: Vec<WorkLogRecord>,
    pub stats: Option<BackendStats>,
}

impl PollPayload {
    pub fn new(records: Vec<WorkLogRecord>) -> Self {
        Self { records, stats: None }
    }

    /// Decodes a bare array or a `{ data, stats? }` envelope.
    ///
    /// Entries that cannot be read as records are skipped; they never fail the whole payload.
    /// Unparseable stats are dropped so counts fall back to local computation.
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let (rows, stats) = match value {
            Value::Array(rows) => (rows, None),
            Value::Object(mut envelope) => match envelope.remove("data") {
                Some(Value::Array(rows)) => {
                    let stats = envelope
                        .remove("stats")
                        .and_then(|stats| serde_json::from_value::<BackendStats>(stats).ok());
                    (rows, stats)
                }
                _ => return Err(FetchError::MalformedPayload),
            },
            _ => return Err(FetchError::MalformedPayload),
        };

        let total = rows.len();
        let records: Vec<WorkLogRecord> = rows
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect();
        if records.len() < total {
            tracing::warn!(skipped = total - records.len(), "ignored malformed work-log rows");
        }

        Ok(Self { records, stats })
    }

    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body).map_err(|e| FetchError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }
}

/// A source of work-log payloads.
pub trait WorkLogSource: Send + Sync + 'static {
    /// Fetches the current records for `query`.
    fn fetch(&self, query: PollQuery) -> impl Future<Output = Result<PollPayload, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_has_no_stats() {
        let payload = PollPayload::from_value(json!([{ "orderSeries": "S1" }])).unwrap();
        assert_eq!(payload.records.len(), 1);
        assert!(payload.stats.is_none());
    }

    #[test]
    fn envelope_carries_stats() {
        let payload = PollPayload::from_value(json!({
            "data": [{ "orderSeries": "S1" }, { "orderSeries": "S2" }],
            "stats": { "total": 2, "operadoresUnicos": 1 }
        }))
        .unwrap();
        assert_eq!(payload.records.len(), 2);
        let stats = payload.stats.unwrap();
        assert_eq!(stats.total, Some(2));
        assert_eq!(stats.operadores_unicos, Some(1));
        assert_eq!(stats.tareas_unicas, None);
    }

    #[test]
    fn object_without_data_is_malformed() {
        assert!(matches!(PollPayload::from_value(json!({ "rows": [] })), Err(FetchError::MalformedPayload)));
        assert!(matches!(PollPayload::from_value(json!("ok")), Err(FetchError::MalformedPayload)));
        assert!(matches!(PollPayload::from_json("<html>"), Err(FetchError::InvalidJson(_))));
    }

    #[test]
    fn non_object_rows_are_skipped() {
        let payload = PollPayload::from_value(json!([{ "orderSeries": "S1" }, 42, null, "x"])).unwrap();
        assert_eq!(payload.records.len(), 1);
    }

    #[test]
    fn date_override_becomes_fecha_param() {
        let query = PollQuery {
            date: NaiveDate::from_ymd_opt(2024, 2, 9),
        };
        assert_eq!(query.params(), vec![("fecha", "2024-02-09".to_string())]);
        assert!(PollQuery::default().params().is_empty());
    }
}
