//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Directory under the home directory holding config, store and logs
pub const DEFAULT_APP_DIR_NAME: &str = ".hotkey-kit";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STORE_FILE_NAME: &str = "hotkeys.json";
pub const LOG_DIR_NAME: &str = "logs";

/// Field separator of the persisted hotkey line
pub const DEFAULT_SEPARATOR: char = ',';

/// Window in which a repeated press of the same hotkey is suppressed
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Default id range handed to the allocator (max is exclusive)
pub const DEFAULT_ID_MIN: u16 = crate::hotkeys::MIN_HOTKEY_ID;
pub const DEFAULT_ID_MAX: u16 = crate::hotkeys::MAX_HOTKEY_ID;

/// Built-in hotkey set used on first run and by reset.
/// (name, combo, action, registered)
pub const DEFAULT_HOTKEYS: &[(&str, &str, &str, bool)] = &[
    ("Log Press", "Alt+Ctrl+F9", "App.LogPress", false),
    ("Exit", "Alt+Ctrl+F12", "App.Exit", false),
];
