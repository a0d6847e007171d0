//! Adaptive poll scheduler.
//!
//! One tokio task drives every fetch-diff-regroup cycle. It owns the timer, issues fetches
//! against a [`WorkLogSource`], and is the only writer of the shared [`AggregationState`].
//!
//! ## States
//!
//! ```text
//!   Stopped ──enable──▶ Active(interval) ◀──enable── Paused
//!                            │                          ▲
//!                            └─────────disable──────────┘
//! ```
//!
//! `enable` runs one cycle immediately and then arms the timer. `disable` only tears the
//! timer down: a fetch already on the wire still completes and is applied.
//!
//! ## Ordering
//!
//! Fetches run as separate tasks bounded by the fetch timeout and report back over a
//! channel. Every fetch is tagged with a request id and the filter generation it was issued
//! for. A result is discarded when its generation is outdated or a newer request has
//! already been applied. Timer ticks never overlap each other; an explicit filter change
//! always fetches, even while a tick is outstanding.
//!
//! Events are published with `try_send`. When the consumer falls behind, events are dropped
//! and polling goes on; the shared state always holds the latest snapshot.

use crate::api::{FetchError, PollPayload, WorkLogSource};
use crate::libs::config::PollConfig;
use crate::libs::engine::{AggregationState, ApplyMode, ApplyOutcome};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// State shared between the scheduler task and readers.
pub type SharedState = Arc<Mutex<AggregationState>>;

/// Whether the consumer of the aggregated data is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Foreground,
    Background,
}

impl Visibility {
    pub fn toggled(self) -> Self {
        match self {
            Visibility::Foreground => Visibility::Background,
            Visibility::Background => Visibility::Foreground,
        }
    }
}

/// Source of visibility changes.
pub trait VisibilityObserver {
    fn subscribe(&self) -> watch::Receiver<Visibility>;
}

/// Visibility flipped by hand, e.g. from a signal handler.
#[derive(Debug, Clone)]
pub struct ManualVisibility {
    tx: Arc<watch::Sender<Visibility>>,
}

impl ManualVisibility {
    pub fn new(initial: Visibility) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    /// Publishes `visibility`. Setting the current value is not a change.
    pub fn set(&self, visibility: Visibility) {
        self.tx.send_if_modified(|current| {
            if *current == visibility {
                return false;
            }
            *current = visibility;
            true
        });
    }

    pub fn toggle(&self) -> Visibility {
        let next = self.current().toggled();
        self.set(next);
        next
    }
}

impl Default for ManualVisibility {
    fn default() -> Self {
        Self::new(Visibility::Foreground)
    }
}

impl VisibilityObserver for ManualVisibility {
    fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Active(Duration),
    Paused,
}

/// Events published to the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PollMessage {
    /// A fetch was issued.
    Loading,
    /// A payload changed the snapshot.
    Updated(ApplyOutcome),
    /// A payload matched the current snapshot.
    Unchanged,
    /// The cycle failed; the snapshot was kept.
    Failed(String),
    /// A result arrived for an outdated request and was dropped.
    Discarded,
    StateChanged(SchedulerState),
}

#[derive(Debug)]
enum Command {
    Enable,
    Disable,
    ApplyFilters(Option<NaiveDate>),
    Shutdown,
}

#[derive(Debug)]
struct CycleResult {
    request_id: u64,
    generation: u64,
    mode: ApplyMode,
    result: Result<PollPayload, FetchError>,
}

/// Controls a running scheduler task.
#[derive(Debug)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn enable(&self) {
        let _ = self.commands.send(Command::Enable);
    }

    pub fn disable(&self) {
        let _ = self.commands.send(Command::Disable);
    }

    /// Switches the inspected day (`None` for today) and reloads from scratch.
    pub fn apply_filters(&self, date: Option<NaiveDate>) {
        let _ = self.commands.send(Command::ApplyFilters(date));
    }

    /// Stops the scheduler and waits for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

pub struct PollScheduler<S: WorkLogSource> {
    source: Arc<S>,
    state: SharedState,
    poll: PollConfig,
    visibility: watch::Receiver<Visibility>,
}

impl<S: WorkLogSource> PollScheduler<S> {
    pub fn new(source: S, visibility: &impl VisibilityObserver, state: SharedState, poll: PollConfig) -> Self {
        Self {
            source: Arc::new(source),
            state,
            poll,
            visibility: visibility.subscribe(),
        }
    }

    /// Starts the scheduler task in the `Stopped` state.
    pub fn spawn(self) -> (SchedulerHandle, mpsc::Receiver<PollMessage>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(32);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let runner = Runner {
            source: self.source,
            state: self.state,
            poll: self.poll,
            visibility: self.visibility,
            visibility_open: true,
            commands: commands_rx,
            events: events_tx,
            results_tx,
            results_rx,
            timer: None,
            current: SchedulerState::Stopped,
            next_request_id: 0,
            last_applied: None,
            tick_in_flight: None,
        };
        let task = tokio::spawn(runner.run());

        (SchedulerHandle { commands: commands_tx, task }, events_rx)
    }
}

struct Runner<S: WorkLogSource> {
    source: Arc<S>,
    state: SharedState,
    poll: PollConfig,
    visibility: watch::Receiver<Visibility>,
    visibility_open: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<PollMessage>,
    results_tx: mpsc::UnboundedSender<CycleResult>,
    results_rx: mpsc::UnboundedReceiver<CycleResult>,
    timer: Option<Interval>,
    current: SchedulerState,
    next_request_id: u64,
    last_applied: Option<u64>,
    tick_in_flight: Option<u64>,
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl<S: WorkLogSource> Runner<S> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Enable) => self.enable().await,
                    Some(Command::Disable) => self.disable().await,
                    Some(Command::ApplyFilters(date)) => self.apply_filters(date).await,
                    Some(Command::Shutdown) | None => break,
                },
                changed = self.visibility.changed(), if self.visibility_open => {
                    if changed.is_err() {
                        self.visibility_open = false;
                        continue;
                    }
                    self.visibility.borrow_and_update();
                    self.on_visibility_change().await;
                }
                _ = next_tick(&mut self.timer) => {
                    if self.tick_in_flight.is_some() {
                        tracing::debug!("previous cycle still outstanding, skipping tick");
                        continue;
                    }
                    self.tick_in_flight = Some(self.start_cycle(ApplyMode::Diff).await);
                }
                Some(result) = self.results_rx.recv() => self.on_result(result).await,
            }
        }

        self.timer = None;
        self.set_state(SchedulerState::Stopped);
        tracing::debug!("poll scheduler stopped");
    }

    fn interval(&self) -> Duration {
        match *self.visibility.borrow() {
            Visibility::Foreground => self.poll.foreground_interval(),
            Visibility::Background => self.poll.background_interval(),
        }
    }

    fn arm(&mut self) -> Duration {
        let period = self.interval();
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
        period
    }

    fn set_state(&mut self, state: SchedulerState) {
        if self.current != state {
            self.current = state;
            self.emit(PollMessage::StateChanged(state));
        }
    }

    /// Publishes an event without waiting. A consumer that stops reading only loses events;
    /// the cycle loop keeps running.
    fn emit(&self, message: PollMessage) {
        match self.events.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::debug!(?message, "event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    async fn enable(&mut self) {
        if matches!(self.current, SchedulerState::Active(_)) {
            return;
        }
        let period = self.arm();
        self.set_state(SchedulerState::Active(period));
        tracing::info!(interval_secs = period.as_secs(), "polling enabled");

        if self.tick_in_flight.is_none() {
            self.tick_in_flight = Some(self.start_cycle(ApplyMode::Diff).await);
        }
    }

    async fn disable(&mut self) {
        if !matches!(self.current, SchedulerState::Active(_)) {
            return;
        }
        self.timer = None;
        self.set_state(SchedulerState::Paused);
        tracing::info!("polling paused");
    }

    async fn apply_filters(&mut self, date: Option<NaiveDate>) {
        let generation = self.state.lock().set_date_override(date);
        tracing::info!(?date, generation, "filters applied, reloading");
        self.start_cycle(ApplyMode::Replace).await;
    }

    async fn on_visibility_change(&mut self) {
        if !matches!(self.current, SchedulerState::Active(_)) {
            return;
        }
        let period = self.arm();
        tracing::debug!(interval_secs = period.as_secs(), "visibility changed, timer re-armed");
        self.set_state(SchedulerState::Active(period));
    }

    async fn start_cycle(&mut self, mode: ApplyMode) -> u64 {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let (query, generation) = {
            let mut state = self.state.lock();
            state.mark_loading();
            (state.query(), state.filter_generation())
        };
        tracing::debug!(request_id, generation, ?mode, "starting poll cycle");

        let source = Arc::clone(&self.source);
        let results = self.results_tx.clone();
        let limit = self.poll.fetch_timeout();
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, source.fetch(query)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit.as_secs())),
            };
            let _ = results.send(CycleResult {
                request_id,
                generation,
                mode,
                result,
            });
        });

        self.emit(PollMessage::Loading);
        request_id
    }

    async fn on_result(&mut self, cycle: CycleResult) {
        if self.tick_in_flight == Some(cycle.request_id) {
            self.tick_in_flight = None;
        }

        let message = {
            let mut state = self.state.lock();
            let outdated = cycle.generation != state.filter_generation()
                || self.last_applied.is_some_and(|last| cycle.request_id < last);

            if outdated {
                tracing::debug!(request_id = cycle.request_id, "discarding outdated poll result");
                PollMessage::Discarded
            } else {
                match cycle.result {
                    Ok(payload) => {
                        self.last_applied = Some(cycle.request_id);
                        let outcome = state.apply(payload, cycle.mode, Instant::now());
                        if outcome.changed {
                            tracing::info!(records = outcome.changed_records, "work-log snapshot updated");
                            PollMessage::Updated(outcome)
                        } else {
                            PollMessage::Unchanged
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "poll cycle failed");
                        state.record_failure(error.to_string());
                        PollMessage::Failed(error.to_string())
                    }
                }
            }
        };

        self.emit(message);
    }
}
