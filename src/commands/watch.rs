//! Live view of the work-log backend.
//!
//! Runs the poll scheduler in the foreground and reprints the group table whenever a cycle
//! changes the snapshot. Ctrl+C or SIGTERM stops it. On unix, SIGUSR1 flips between the
//! foreground and background poll interval. Rows marked as changed are redrawn unmarked
//! once their highlight expires.

use super::{display_date, parse_date};
use crate::{
    api::WorkLogClient,
    libs::{
        config::Config,
        engine::{AggregationState, ApplyOutcome},
        grouping::Dimension,
        messages::Message,
        scheduler::{ManualVisibility, PollMessage, PollScheduler, SchedulerState, SharedState, Visibility},
        view::View,
    },
    msg_debug, msg_error_anyhow, msg_info, msg_print, msg_warning,
};
use anyhow::Result;
use clap::Args;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Grouping dimension shown on each update
    #[arg(short, long, value_enum, default_value = "operator")]
    by: Dimension,

    /// Day to inspect: `today` or YYYY-MM-DD
    #[arg(short, long, default_value = "today")]
    date: String,

    /// Start with the background (slow) poll interval
    #[arg(long)]
    background: bool,
}

pub async fn cmd(args: WatchArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let config = Config::read()?.with_env_overrides();
    let client = WorkLogClient::new(config.require_server()?);
    let poll = config.poll.clone().unwrap_or_default();
    let shift = config.shift.clone().unwrap_or_default();
    let highlight = poll.highlight();

    let state: SharedState = Arc::new(Mutex::new(AggregationState::new(&poll, shift)));
    let visibility = ManualVisibility::new(if args.background {
        Visibility::Background
    } else {
        Visibility::Foreground
    });

    msg_info!(Message::WatchStarted(client.url()));
    let (handle, mut events) = PollScheduler::new(client, &visibility, Arc::clone(&state), poll).spawn();
    if date.is_some() {
        handle.apply_filters(date);
    }
    handle.enable();
    msg_info!(Message::WatchHint);

    let mut toggle = VisibilityToggle::new()?;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut redraw_at: Option<Instant> = None;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = toggle.recv() => {
                let visibility = visibility.toggle();
                msg_info!(Message::VisibilityChanged(format!("{:?}", visibility).to_lowercase()));
            }
            _ = until(redraw_at) => {
                redraw_at = None;
                print_groups(&state, args.by)?;
            }
            message = events.recv() => match message {
                Some(message) => {
                    if let PollMessage::Updated(outcome) = &message {
                        redraw_at = highlight_expiry(outcome, args.by, Instant::now(), highlight).or(redraw_at);
                    }
                    render(&state, args.by, message)?
                }
                None => break,
            },
        }
    }

    drop(events);
    handle.shutdown().await;
    msg_info!(Message::WatchStopped);
    Ok(())
}

fn render(state: &SharedState, dimension: Dimension, message: PollMessage) -> Result<()> {
    match message {
        PollMessage::Updated(outcome) => {
            print_groups(state, dimension)?;
            msg_debug!(Message::GroupsUpdated(outcome.changed_records));
        }
        PollMessage::Failed(error) => {
            msg_warning!(Message::PollFailed(error));
            if !state.lock().snapshot().is_empty() {
                msg_info!(Message::ShowingStaleData);
            }
        }
        PollMessage::StateChanged(SchedulerState::Active(interval)) => {
            msg_info!(Message::PollingResumed(interval.as_secs()));
        }
        PollMessage::StateChanged(SchedulerState::Paused) => {
            msg_info!(Message::PollingPaused);
        }
        PollMessage::Loading | PollMessage::Unchanged | PollMessage::Discarded | PollMessage::StateChanged(SchedulerState::Stopped) => {}
    }
    Ok(())
}

fn print_groups(state: &SharedState, dimension: Dimension) -> Result<()> {
    let state = state.lock();
    msg_print!(Message::GroupsHeader(dimension.to_string(), display_date(state.date_override())), true);
    View::groups(&state.groups_now(dimension))?;
    View::summary(&state.summary())
}

/// When the rows highlighted by `outcome` lose their mark, if any are shown for `dimension`.
fn highlight_expiry(outcome: &ApplyOutcome, dimension: Dimension, now: Instant, highlight: Duration) -> Option<Instant> {
    outcome
        .changed_groups
        .get(&dimension)
        .is_some_and(|keys| !keys.is_empty())
        .then(|| now + highlight)
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| msg_error_anyhow!(Message::SignalHandlerFailed(e.to_string())))?;
        tokio::select! {
            _ = sigterm.recv() => {
                msg_info!(Message::WatchReceivedSigterm);
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                msg_info!(Message::WatchReceivedCtrlC);
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        msg_info!(Message::WatchReceivedCtrlC);
    }

    Ok(())
}

#[cfg(unix)]
struct VisibilityToggle(tokio::signal::unix::Signal);

#[cfg(unix)]
impl VisibilityToggle {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        signal(SignalKind::user_defined1())
            .map(Self)
            .map_err(|e| msg_error_anyhow!(Message::SignalHandlerFailed(e.to_string())))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct VisibilityToggle;

#[cfg(not(unix))]
impl VisibilityToggle {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}
