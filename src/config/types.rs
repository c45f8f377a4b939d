//! Configuration type definitions
//!
//! This module contains all the struct definitions for configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::actions::GROUP_SEPARATOR;
use crate::error::{HotkeyError, Result};
use crate::hotkeys::{IdAllocator, KeyCombination};

// ============================================
// ID RANGE
// ============================================

/// Bounds of the hotkey id namespace (`max` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRangeConfig {
    #[serde(default = "default_id_min")]
    pub min: u16,
    #[serde(default = "default_id_max")]
    pub max: u16,
}

fn default_id_min() -> u16 {
    DEFAULT_ID_MIN
}
fn default_id_max() -> u16 {
    DEFAULT_ID_MAX
}

impl Default for IdRangeConfig {
    fn default() -> Self {
        IdRangeConfig {
            min: DEFAULT_ID_MIN,
            max: DEFAULT_ID_MAX,
        }
    }
}

// ============================================
// DEFAULT HOTKEYS
// ============================================

/// One entry of the built-in hotkey set restored by reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultHotkeyConfig {
    pub name: String,
    /// Combination in canonical form, e.g. "Ctrl+Shift+M"
    pub combo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default)]
    pub registered: bool,
}

impl DefaultHotkeyConfig {
    pub fn combination(&self) -> KeyCombination {
        KeyCombination::parse(&self.combo)
    }

    fn builtin_set() -> Vec<Self> {
        DEFAULT_HOTKEYS
            .iter()
            .map(|(name, combo, action, registered)| DefaultHotkeyConfig {
                name: name.to_string(),
                combo: combo.to_string(),
                action: Some(action.to_string()).filter(|a| !a.is_empty()),
                registered: *registered,
            })
            .collect()
    }
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_range: Option<IdRangeConfig>,
    /// Hotkey store location; `~` is expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    /// Log directory; `~` is expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_hotkeys: Option<Vec<DefaultHotkeyConfig>>,
}

/// `~/.hotkey-kit`, falling back to the temp dir when there is no home.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_APP_DIR_NAME)
}

/// Default location of `config.json`.
pub fn default_config_path() -> PathBuf {
    app_dir().join(CONFIG_FILE_NAME)
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Config {
    pub fn get_separator(&self) -> char {
        self.separator.unwrap_or(DEFAULT_SEPARATOR)
    }

    pub fn get_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn get_id_range(&self) -> IdRangeConfig {
        self.id_range.unwrap_or_default()
    }

    pub fn get_store_path(&self) -> PathBuf {
        self.store_path
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| app_dir().join(STORE_FILE_NAME))
    }

    pub fn get_log_dir(&self) -> PathBuf {
        self.log_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| app_dir().join(LOG_DIR_NAME))
    }

    pub fn get_default_hotkeys(&self) -> Vec<DefaultHotkeyConfig> {
        self.default_hotkeys
            .clone()
            .unwrap_or_else(DefaultHotkeyConfig::builtin_set)
    }

    /// Allocator over the configured id range.
    pub fn id_allocator(&self) -> Result<IdAllocator> {
        let range = self.get_id_range();
        IdAllocator::with_bounds(range.min, range.max)
    }

    /// Reject values the rest of the crate cannot work with.
    pub fn validate(&self) -> Result<()> {
        let separator = self.get_separator();
        if separator == '+' || separator.is_whitespace() || separator.is_alphanumeric() {
            return Err(HotkeyError::Config(format!(
                "separator {:?} collides with the combination format",
                separator
            )));
        }
        // Action ids are written unescaped, so the separator must never occur in one.
        if separator == GROUP_SEPARATOR {
            return Err(HotkeyError::Config(format!(
                "separator {:?} collides with action identifiers",
                separator
            )));
        }
        self.id_allocator()?;
        if let Some(defaults) = &self.default_hotkeys {
            if let Some(entry) = defaults.iter().find(|d| d.name.contains(separator)) {
                return Err(HotkeyError::Config(format!(
                    "default hotkey name {:?} contains the separator",
                    entry.name
                )));
            }
            if let Some(action) = defaults
                .iter()
                .filter_map(|d| d.action.as_deref())
                .find(|action| action.contains(separator))
            {
                return Err(HotkeyError::Config(format!(
                    "default action {:?} contains the separator",
                    action
                )));
            }
        }
        Ok(())
    }
}
