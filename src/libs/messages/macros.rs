//! Macros for printing [`Message`](super::Message)s.
//!
//! Every macro routes its output through one of two paths:
//!
//! - **Debug mode** (`FLOORLOG_DEBUG` or `RUST_LOG` set): the message becomes a `tracing`
//!   event, so it lines up with the engine's structured logs.
//! - **Normal mode**: plain `println!`/`eprintln!` with an emoji prefix.
//!
//! Passing `true` as a second argument surrounds the message with blank lines.
//!
//! ```rust,no_run
//! use floorlog::libs::messages::Message;
//! use floorlog::{msg_error, msg_info, msg_success};
//!
//! msg_success!(Message::ConfigSaved);
//! msg_info!(Message::WatchHint, true);
//! msg_error!(Message::NoGroups);
//! ```

use std::sync::OnceLock;

static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

/// Whether message output should go through `tracing`. Checked once per process.
#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| std::env::var("FLOORLOG_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __msg_emit {
    ($event:ident, $print:ident, $prefix:literal, $msg:expr, $spaced:expr) => {{
        let text = if $spaced {
            format!("\n{}{}\n", $prefix, $msg)
        } else {
            format!("{}{}", $prefix, $msg)
        };
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::$event!("{}", text);
        } else {
            $print!("{}", text);
        }
    }};
}

/// Prints a message without prefix.
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "", $msg, false)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "", $msg, true)
    };
}

/// Prints a success message with ✅ prefix.
#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "✅ ", $msg, false)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "✅ ", $msg, true)
    };
}

/// Prints an error message with ❌ prefix to stderr.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        $crate::__msg_emit!(error, eprintln, "❌ ", $msg, false)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(error, eprintln, "❌ ", $msg, true)
    };
}

/// Prints a warning with ⚠️ prefix to stderr.
#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        $crate::__msg_emit!(warn, eprintln, "⚠️ ", $msg, false)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(warn, eprintln, "⚠️ ", $msg, true)
    };
}

/// Prints an informational message with ℹ️ prefix.
#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "ℹ️ ", $msg, false)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "ℹ️ ", $msg, true)
    };
}

/// Debug-only output; silent in normal mode.
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// Builds an `anyhow::Error` from a message.
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}

/// Returns early with an `anyhow::Error` built from a message.
#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("❌ {}", $msg)
    };
}
