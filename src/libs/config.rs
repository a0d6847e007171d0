//! Configuration management for floorlog.
//!
//! Settings live in `config.json` inside the platform data directory resolved by
//! [`DataStorage`]. Every section is optional; a missing file or section falls back to
//! defaults, so floorlog runs with nothing but a backend URL.
//!
//! ## Sections
//!
//! - **server**: where the work-log backend lives and how to authenticate
//! - **poll**: scheduler cadence, fetch timeout, highlight duration, unit shim
//! - **shift**: the fixed working shift used for time accounting
//!
//! ## Environment Overrides
//!
//! `FLOORLOG_API_URL`, `FLOORLOG_ENDPOINT` and `FLOORLOG_API_TOKEN` override the server
//! section. A `.env` file in the working directory is loaded first when present.
//!
//! ```rust,no_run
//! use floorlog::libs::config::Config;
//!
//! let config = Config::read()?.with_env_overrides();
//! let poll = config.poll.clone().unwrap_or_default();
//! println!("Polling every {}s", poll.foreground_interval_secs);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;
use chrono::NaiveTime;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_API_URL: &str = "FLOORLOG_API_URL";
pub const ENV_ENDPOINT: &str = "FLOORLOG_ENDPOINT";
pub const ENV_API_TOKEN: &str = "FLOORLOG_API_TOKEN";

const DEFAULT_ENDPOINT: &str = "worklogs/live";

/// A configurable section shown in the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Work-log backend connection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Base URL, e.g. `https://erp.example.com/api`.
    pub api_url: String,
    /// Path of the polling endpoint relative to `api_url`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token sent with every poll; empty means no auth header.
    #[serde(default)]
    pub auth_token: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Poll scheduler settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between polls while the view is visible.
    pub foreground_interval_secs: u64,
    /// Seconds between polls while the view is hidden or backgrounded.
    pub background_interval_secs: u64,
    /// A fetch still pending after this many seconds counts as a failed cycle.
    pub fetch_timeout_secs: u64,
    /// How long a changed group stays marked as recently changed.
    pub highlight_ms: u64,
    /// Read `dedicatedSeconds` above 1e9 as milliseconds.
    ///
    /// Compatibility shim for backends that report milliseconds. Off by default: the unit is seconds.
    pub legacy_millis_heuristic: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            foreground_interval_secs: 10,
            background_interval_secs: 60,
            fetch_timeout_secs: 15,
            highlight_ms: 1000,
            legacy_millis_heuristic: false,
        }
    }
}

impl PollConfig {
    pub fn foreground_interval(&self) -> Duration {
        Duration::from_secs(self.foreground_interval_secs.max(1))
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

/// The fixed daily shift all time accounting is measured against.
///
/// Defaults: starts 06:30, lasts 7.5 hours, unpaid break 09:30-10:00,
/// open entries are measured up to 14:00 at most.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ShiftConfig {
    pub start: NaiveTime,
    pub duration_secs: u64,
    pub break_start: NaiveTime,
    pub break_end: NaiveTime,
    pub open_cutoff: NaiveTime,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        ShiftConfig {
            start: NaiveTime::from_hms_opt(6, 30, 0).unwrap_or_default(),
            duration_secs: 27_000,
            break_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            break_end: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            open_cutoff: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
        }
    }
}

/// Root configuration object.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<ShiftConfig>,
}

impl Config {
    /// Reads the configuration file, or returns defaults if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Applies `FLOORLOG_*` environment variables on top of the file settings.
    ///
    /// A `.env` file is loaded first when present. An API URL from the environment
    /// creates the server section if the file had none.
    pub fn with_env_overrides(mut self) -> Self {
        dotenv::dotenv().ok();

        let api_url = env::var(ENV_API_URL).ok().filter(|v| !v.is_empty());
        if self.server.is_none() {
            if let Some(api_url) = &api_url {
                self.server = Some(ServerConfig {
                    api_url: api_url.clone(),
                    endpoint: default_endpoint(),
                    auth_token: String::new(),
                });
            }
        }

        if let Some(server) = self.server.as_mut() {
            if let Some(api_url) = api_url {
                server.api_url = api_url;
            }
            if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
                server.endpoint = endpoint;
            }
            if let Ok(token) = env::var(ENV_API_TOKEN) {
                server.auth_token = token;
            }
        }
        self
    }

    /// The server section, or an error telling the user how to configure it.
    pub fn require_server(&self) -> Result<&ServerConfig> {
        match &self.server {
            Some(server) if !server.api_url.trim().is_empty() => Ok(server),
            _ => msg_bail_anyhow!(Message::ServerNotConfigured),
        }
    }

    /// Removes the configuration file if it exists.
    pub fn delete() -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if config_file_path.exists() {
            fs::remove_file(config_file_path)?;
        }
        Ok(())
    }

    /// Runs the interactive setup wizard, starting from the saved settings.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "server".to_string(),
                name: Message::ConfigModuleServer.to_string(),
            },
            ConfigModule {
                key: "poll".to_string(),
                name: Message::ConfigModulePoll.to_string(),
            },
            ConfigModule {
                key: "shift".to_string(),
                name: Message::ConfigModuleShift.to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "server" => {
                    let default = config.server.clone().unwrap_or(ServerConfig {
                        api_url: "".to_string(),
                        endpoint: default_endpoint(),
                        auth_token: "".to_string(),
                    });
                    msg_print!(Message::ConfigModuleServer);
                    config.server = Some(ServerConfig {
                        api_url: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptServerApiUrl.to_string())
                            .default(default.api_url)
                            .interact_text()?,
                        endpoint: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptServerEndpoint.to_string())
                            .default(default.endpoint)
                            .interact_text()?,
                        auth_token: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptServerAuthToken.to_string())
                            .default(default.auth_token)
                            .allow_empty(true)
                            .interact_text()?,
                    });
                }
                "poll" => {
                    let default = config.poll.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModulePoll);
                    config.poll = Some(PollConfig {
                        foreground_interval_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptForegroundInterval.to_string())
                            .default(default.foreground_interval_secs)
                            .interact_text()?,
                        background_interval_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBackgroundInterval.to_string())
                            .default(default.background_interval_secs)
                            .interact_text()?,
                        fetch_timeout_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptFetchTimeout.to_string())
                            .default(default.fetch_timeout_secs)
                            .interact_text()?,
                        highlight_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptHighlightMs.to_string())
                            .default(default.highlight_ms)
                            .interact_text()?,
                        legacy_millis_heuristic: Confirm::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptLegacyMillis.to_string())
                            .default(default.legacy_millis_heuristic)
                            .interact()?,
                    });
                }
                "shift" => {
                    let default = config.shift.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleShift);
                    config.shift = Some(ShiftConfig {
                        start: prompt_time(Message::PromptShiftStart, default.start)?,
                        duration_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptShiftDuration.to_string())
                            .default(default.duration_secs)
                            .interact_text()?,
                        break_start: prompt_time(Message::PromptBreakStart, default.break_start)?,
                        break_end: prompt_time(Message::PromptBreakEnd, default.break_end)?,
                        open_cutoff: prompt_time(Message::PromptOpenCutoff, default.open_cutoff)?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

fn prompt_time(prompt: Message, default: NaiveTime) -> Result<NaiveTime> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt.to_string())
        .default(default.format("%H:%M").to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            crate::libs::record::parse_time(input)
                .map(|_| ())
                .ok_or_else(|| Message::InvalidTimeFormat(input.clone()).to_string())
        })
        .interact_text()?;
    Ok(crate::libs::record::parse_time(&value).unwrap_or(default))
}
