//! Core library modules for floorlog.
//!
//! ## Layout
//!
//! - **Model**: [`record`], [`snapshot`]
//! - **Aggregation**: [`diff`], [`grouping`], [`productivity`], [`anomaly`], [`engine`]
//! - **Runtime**: [`scheduler`]
//! - **Infrastructure**: [`config`], [`data_storage`], [`messages`]
//! - **Output**: [`formatter`], [`view`], [`export`]
//!
//! ```rust,no_run
//! use floorlog::api::PollPayload;
//! use floorlog::libs::engine::{AggregationState, ApplyMode};
//! use floorlog::libs::grouping::Dimension;
//!
//! let mut state = AggregationState::default();
//! state.apply(PollPayload::from_json("[]")?, ApplyMode::Replace, tokio::time::Instant::now());
//! for group in state.groups_now(Dimension::Operator) {
//!     println!("{}: {} records", group.key, group.record_count);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod anomaly;
pub mod config;
pub mod data_storage;
pub mod diff;
pub mod engine;
pub mod export;
pub mod formatter;
pub mod grouping;
pub mod messages;
pub mod productivity;
pub mod record;
pub mod scheduler;
pub mod snapshot;
pub mod view;
