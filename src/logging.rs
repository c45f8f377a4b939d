//! Structured JSONL logging for tooling and human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (`<log_dir>/hotkey-kit.jsonl`) - one JSON object per line
//! - **Pretty to stderr** - compact, human-readable
//!
//! # Usage
//!
//! ```rust,ignore
//! use hotkey_kit::{config, logging};
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let config = config::load_config(None);
//! let _guard = logging::init(&config);
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! ```
//!
//! # JSONL Output Format
//!
//! ```json
//! {"timestamp":"2026-10-17T10:30:45.123Z","level":"INFO","target":"hotkey_kit::hotkeys::registration","fields":{"event_type":"hotkey_registration","action":"register","combo":"Ctrl+Shift+M","id":3,"success":true,"message":"register Ctrl+Shift+M (id 3)"}}
//! ```

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::sync::OnceLock;

use parking_lot::Mutex;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::error::HotkeyError;
use crate::hotkeys::OsError;

const LOG_FILE_NAME: &str = "hotkey-kit.jsonl";

// RFC 3339 in UTC with millisecond precision.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

// In-memory buffer of recent lines, for a diagnostics view.
static LOG_BUFFER: OnceLock<LogBuffer> = OnceLock::new();
const MAX_LOG_LINES: usize = 50;

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// If the log file cannot be opened, logging continues on stderr only.
/// Calling this more than once keeps the first subscriber.
pub fn init(config: &Config) -> LoggingGuard {
    let log_dir = config.get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    let (json_layer, file_guard) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            // Non-blocking writer keeps file I/O off the message thread.
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::new(TIMESTAMP_FORMAT))
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file {}: {}", log_path.display(), e);
            (None, None)
        }
    };

    // Default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            event_type = "app_lifecycle",
            action = "started",
            log_path = %log_path.display(),
            "Logging initialized"
        );
    }

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Categorised one-line log, also kept in the recent-lines buffer.
///
/// Prefer tracing macros directly for structured fields.
pub fn log(category: &str, message: &str) {
    buffer().push(category, message);
    tracing::info!(category = category, "{}", message);
}

/// Recent log lines, oldest first.
pub fn recent_logs() -> Vec<String> {
    buffer().recent()
}

fn buffer() -> &'static LogBuffer {
    LOG_BUFFER.get_or_init(|| LogBuffer::new(MAX_LOG_LINES))
}

/// Bounded list of `[CATEGORY] message` lines; the oldest line goes first.
struct LogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogBuffer {
    fn new(capacity: usize) -> Self {
        LogBuffer {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn push(&self, category: &str, message: &str) {
        let mut lines = self.lines.lock();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(format!("[{}] {}", category, message));
    }

    fn recent(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

// =============================================================================
// STRUCTURED LOGGING HELPERS
// =============================================================================

/// Log an OS register/unregister outcome.
pub fn log_registration_event(combo: &str, id: Option<u16>, action: &str, error: Option<&OsError>) {
    let line = registration_line(combo, id, action, error);
    buffer().push("HOTKEY", &line);
    match error {
        None => tracing::info!(
            event_type = "hotkey_registration",
            action = action,
            combo = combo,
            id = id,
            success = true,
            "{}", line
        ),
        Some(error) => tracing::warn!(
            event_type = "hotkey_registration",
            action = action,
            combo = combo,
            id = id,
            success = false,
            os_error_code = error.code,
            os_error = %error.message,
            "{}", line
        ),
    }
}

fn registration_line(combo: &str, id: Option<u16>, action: &str, error: Option<&OsError>) -> String {
    let id_text = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match error {
        None => format!("{} {} (id {})", action, combo, id_text),
        Some(error) => format!("{} {} (id {}) failed: {}", action, combo, id_text, error),
    }
}

/// Log a dispatched hotkey press.
pub fn log_press_event(hotkey: &str, combo: &str, id: u16, outcome: &str) {
    buffer().push("PRESS", &format!("{} [{}] id={} {}", hotkey, combo, id, outcome));
    tracing::debug!(
        event_type = "hotkey_press",
        hotkey = hotkey,
        combo = combo,
        id = id,
        outcome = outcome,
        "Hotkey {} pressed: {}", hotkey, outcome
    );
}

/// Log a library error the caller recovers from. The buffer gets the
/// user-facing text, the log the full error.
pub fn log_error(context: &str, error: &HotkeyError) {
    let user_message = error.user_message();
    buffer().push("ERROR", &format!("{}: {}", context, user_message));
    tracing::error!(
        event_type = "error",
        context = context,
        error = %error,
        user_message = %user_message,
        "{} failed: {}", context, error
    );
}
