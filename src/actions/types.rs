//! Action types and data structures
//!
//! Core types for the actions system: the HotkeyAction contract, the context a
//! press hands to it, and the settings an action declares.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::hotkeys::KeyCombination;

/// Callback for closure-backed actions.
/// Returns whether the press was handled.
pub type ActionCallback = Arc<dyn Fn(&ActionContext<'_>) -> bool + Send + Sync>;

/// What an action sees when its hotkey fires.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Name of the hotkey that fired
    pub hotkey: &'a str,
    pub combo: KeyCombination,
    /// OS id the press was delivered under
    pub id: u16,
    pub at: Instant,
    pub settings: &'a [ActionSetting],
}

impl<'a> ActionContext<'a> {
    /// Serialized value of the named setting, if the hotkey carries it.
    pub fn setting(&self, name: &str) -> Option<&'a str> {
        self.settings
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.as_str())
    }

    pub fn setting_bool(&self, name: &str) -> Option<bool> {
        self.setting(name).and_then(|v| match v.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }
}

/// A per-hotkey setting value, persisted next to the hotkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSetting {
    pub name: String,
    pub value: String,
}

impl ActionSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        ActionSetting {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingType {
    Bool,
    Integer,
    Float,
    String,
}

/// A setting an action declares: name, declared value type, description and
/// the serialized default filled in when a hotkey lacks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSettingSpec {
    pub name: String,
    pub value_type: SettingType,
    pub description: String,
    pub default: String,
}

impl ActionSettingSpec {
    pub fn new(
        name: impl Into<String>,
        value_type: SettingType,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        ActionSettingSpec {
            name: name.into(),
            value_type,
            description: description.into(),
            default: default.into(),
        }
    }

    pub fn default_setting(&self) -> ActionSetting {
        ActionSetting::new(self.name.clone(), self.default.clone())
    }
}

/// An invocable handler a hotkey can be bound to.
pub trait HotkeyAction: Send + Sync {
    /// Run the action. Returns whether the press was handled.
    fn invoke(&self, ctx: &ActionContext<'_>) -> bool;

    fn settings(&self) -> &[ActionSettingSpec] {
        &[]
    }

    fn description(&self) -> &str {
        ""
    }
}

/// Action backed by a closure.
#[derive(Clone)]
pub struct FnAction {
    callback: ActionCallback,
    settings: Vec<ActionSettingSpec>,
    description: String,
}

impl FnAction {
    pub fn new(callback: impl Fn(&ActionContext<'_>) -> bool + Send + Sync + 'static) -> Self {
        FnAction {
            callback: Arc::new(callback),
            settings: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_setting(mut self, spec: ActionSettingSpec) -> Self {
        self.settings.push(spec);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Debug for FnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("settings", &self.settings)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl HotkeyAction for FnAction {
    fn invoke(&self, ctx: &ActionContext<'_>) -> bool {
        (self.callback)(ctx)
    }

    fn settings(&self) -> &[ActionSettingSpec] {
        &self.settings
    }

    fn description(&self) -> &str {
        &self.description
    }
}
