//! Configuration module - Application settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.hotkey-kit/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, IdRangeConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{DEFAULT_DEBOUNCE_MS, DEFAULT_SEPARATOR};

pub use types::{app_dir, default_config_path, Config, DefaultHotkeyConfig, IdRangeConfig};

pub use loader::load_config;

#[cfg(test)]
pub use defaults::{DEFAULT_HOTKEYS, DEFAULT_ID_MAX, DEFAULT_ID_MIN};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
