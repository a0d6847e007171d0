//! Display implementation for floorlog messages.
//!
//! All user-facing text lives here, one arm per [`Message`] variant, so wording stays
//! consistent across commands and the wizard.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleServer => "Work-log server".to_string(),
            Message::ConfigModulePoll => "Polling".to_string(),
            Message::ConfigModuleShift => "Shift schedule".to_string(),
            Message::ServerNotConfigured => "Work-log server is not configured. Run `floorlog init` or set FLOORLOG_API_URL".to_string(),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select nodes to configure".to_string(),
            Message::PromptServerApiUrl => "Enter server API URL".to_string(),
            Message::PromptServerEndpoint => "Enter polling endpoint path".to_string(),
            Message::PromptServerAuthToken => "Enter server auth token (optional)".to_string(),
            Message::PromptForegroundInterval => "Enter poll interval while visible (seconds)".to_string(),
            Message::PromptBackgroundInterval => "Enter poll interval while hidden (seconds)".to_string(),
            Message::PromptFetchTimeout => "Enter fetch timeout (seconds)".to_string(),
            Message::PromptHighlightMs => "Enter change highlight duration (milliseconds)".to_string(),
            Message::PromptLegacyMillis => "Treat dedicated time above 1e9 as milliseconds?".to_string(),
            Message::PromptShiftStart => "Enter shift start (HH:MM)".to_string(),
            Message::PromptShiftDuration => "Enter shift duration (seconds)".to_string(),
            Message::PromptBreakStart => "Enter break start (HH:MM)".to_string(),
            Message::PromptBreakEnd => "Enter break end (HH:MM)".to_string(),
            Message::PromptOpenCutoff => "Enter cutoff for open entries (HH:MM)".to_string(),

            // === INPUT VALIDATION ===
            Message::InvalidTimeFormat(value) => format!("Invalid time '{}'. Expected HH:MM or HH:MM:SS", value),
            Message::InvalidDateFormat(value) => format!("Invalid date '{}'. Expected 'today' or YYYY-MM-DD", value),

            // === WATCH MESSAGES ===
            Message::WatchStarted(url) => format!("Watching {}", url),
            Message::WatchHint => "Press Ctrl+C to stop, send SIGUSR1 to toggle background polling".to_string(),
            Message::WatchStopped => "Watch stopped".to_string(),
            Message::WatchReceivedCtrlC => "Received Ctrl+C, stopping".to_string(),
            Message::WatchReceivedSigterm => "Received SIGTERM, stopping".to_string(),
            Message::SignalHandlerFailed(error) => format!("Failed to install signal handler: {}", error),
            Message::VisibilityChanged(visibility) => format!("Visibility changed to {}", visibility),
            Message::PollingResumed(secs) => format!("Polling every {} seconds", secs),
            Message::PollingPaused => "Polling paused".to_string(),
            Message::PollFailed(error) => format!("Poll failed: {}", error),
            Message::ShowingStaleData => "Showing last known data".to_string(),
            Message::GroupsUpdated(count) => format!("{} records changed", count),

            // === REPORT MESSAGES ===
            Message::GroupsHeader(dimension, date) => format!("Work by {} for {}", dimension, date),
            Message::SummaryHeader(date) => format!("Summary for {}", date),
            Message::NoGroups => "No work-log entries found".to_string(),
            Message::FetchFailed(error) => format!("Failed to fetch work-log entries: {}", error),

            // === EXPORT MESSAGES ===
            Message::ExportCompleted(path) => format!("Data exported successfully to: {}", path),
            Message::ExportNoData => "Nothing to export".to_string(),
        };

        write!(f, "{}", text)
    }
}
