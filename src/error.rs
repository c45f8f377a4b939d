use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

/// Domain-specific errors for the hotkey subsystem.
///
/// OS registration failures are absent: they are captured into a
/// registration's `Failed` state (see [`crate::hotkeys::OsError`]) and never
/// surface as an `Err` from the core operations.
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse hotkey store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid hotkey id range {min:#06x}..{max:#06x}: need at least one usable id")]
    InvalidIdRange { min: u16, max: u16 },

    #[error("No hotkey with handle {0}")]
    UnknownHotkey(String),
}

impl HotkeyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, user-facing description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { path, .. } => format!("Could not access {}", path.display()),
            Self::Json(e) => format!("Saved hotkeys are corrupt: {}", e),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::InvalidIdRange { .. } => "Hotkey id range is misconfigured".to_string(),
            Self::UnknownHotkey(_) => "That hotkey no longer exists".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HotkeyError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the caller cannot propagate.
///
/// # Examples
///
/// ```ignore
/// use hotkey_kit::error::ResultExt;
///
/// // Persisting from a guard's Drop: log and continue
/// collection.save().log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for "impossible" states that should crash during development
/// but gracefully degrade in production.
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}
