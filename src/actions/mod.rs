//! Actions Module
//!
//! Maps string identifiers to handlers that run when a hotkey fires.
//!
//! ## Module Structure
//! - `types`: Core types (HotkeyAction, ActionContext, ActionSetting, FnAction)
//! - `registry`: ActionRegistry and the ActionGroup trait (`"<Group>.<Action>"` ids)
//! - `binding`: ActionBinding and the press Debouncer
//! - `builtins`: the `App` group

mod binding;
mod builtins;
mod registry;
mod types;

// Re-export public API

// Types
pub use types::{
    ActionCallback, ActionContext, ActionSetting, ActionSettingSpec, FnAction, HotkeyAction,
    SettingType,
};

// Registry
pub use registry::{action_identifier, ActionGroup, ActionRegistry, GROUP_SEPARATOR};

// Binding
pub use binding::{fill_default_settings, ActionBinding, Debouncer, FireOutcome};

// Built-ins
pub use builtins::{AppActions, APP_GROUP, EXIT_ACTION, LOG_PRESS_ACTION};
