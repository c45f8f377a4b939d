//! Named, persisted hotkey with an optional action binding.

use std::time::{Duration, Instant};

use super::combination::KeyCombination;
use super::persistence::HotkeyRecord;
use super::registration::{HotkeyRegistration, RegistrationStatus};
use super::service::{HostMessage, HotkeyContext, HotkeyService, OwnerHandle};
use crate::actions::{ActionBinding, ActionContext, ActionRegistry, ActionSetting};
use crate::logging;

#[derive(Debug)]
pub struct BindableHotkey {
    name: String,
    registration: HotkeyRegistration,
    action_id: Option<String>,
    action_settings: Vec<ActionSetting>,
    binding: Option<ActionBinding>,
}

impl BindableHotkey {
    pub fn new(name: impl Into<String>, combo: KeyCombination, owner: OwnerHandle) -> Self {
        BindableHotkey {
            name: name.into(),
            registration: HotkeyRegistration::new(combo, owner),
            action_id: None,
            action_settings: Vec::new(),
            binding: None,
        }
    }

    /// Rebuild from a saved record. Registration is left to the caller so the
    /// record's flag can be applied once the hotkey is bound.
    pub fn from_record(record: HotkeyRecord, owner: OwnerHandle) -> Self {
        BindableHotkey {
            name: record.name,
            registration: HotkeyRegistration::new(record.combo, owner),
            action_id: record.action,
            action_settings: record.settings,
            binding: None,
        }
    }

    pub fn to_record(&self) -> HotkeyRecord {
        HotkeyRecord {
            name: self.name.clone(),
            combo: self.combo(),
            action: self.action_id.clone(),
            registered: self.is_registered(),
            settings: self.action_settings.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name == self.name {
            return false;
        }
        self.name = name;
        true
    }

    pub fn registration(&self) -> &HotkeyRegistration {
        &self.registration
    }

    pub fn registration_mut(&mut self) -> &mut HotkeyRegistration {
        &mut self.registration
    }

    pub fn combo(&self) -> KeyCombination {
        self.registration.combo()
    }

    pub fn status(&self) -> RegistrationStatus {
        self.registration.status()
    }

    pub fn id(&self) -> Option<u16> {
        self.registration.id()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_registered()
    }

    pub fn action_id(&self) -> Option<&str> {
        self.action_id.as_deref()
    }

    pub fn action_settings(&self) -> &[ActionSetting] {
        &self.action_settings
    }

    pub fn binding(&self) -> Option<&ActionBinding> {
        self.binding.as_ref()
    }

    /// Change the action identifier. Drops the current binding; call
    /// [`bind`](Self::bind) to resolve the new one.
    pub fn set_action(&mut self, action_id: Option<String>) -> bool {
        let action_id = action_id.filter(|a| !a.is_empty());
        if action_id == self.action_id {
            return false;
        }
        self.action_id = action_id;
        self.binding = None;
        true
    }

    pub fn set_settings(&mut self, settings: Vec<ActionSetting>) -> bool {
        if settings == self.action_settings {
            return false;
        }
        self.action_settings = settings;
        true
    }

    /// Set one setting, adding it when absent.
    pub fn set_setting(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.action_settings.iter_mut().find(|s| s.name == name) {
            Some(setting) if setting.value == value => false,
            Some(setting) => {
                setting.value = value;
                true
            }
            None => {
                self.action_settings.push(ActionSetting::new(name, value));
                true
            }
        }
    }

    /// Resolve the action identifier against `registry`. Unknown identifiers
    /// are kept so they persist, but bind nothing. Returns true when bound.
    pub fn bind(&mut self, registry: &ActionRegistry, debounce: Duration) -> bool {
        self.binding = self.action_id.as_deref().and_then(|action_id| {
            let binding =
                ActionBinding::resolve(registry, action_id, &mut self.action_settings, debounce);
            if binding.is_none() {
                tracing::warn!(
                    hotkey = %self.name,
                    action = action_id,
                    "Unknown action identifier, hotkey left unbound"
                );
            }
            binding
        });
        self.binding.is_some()
    }

    /// Register or unregister to match `registered`.
    pub fn set_registered<S: HotkeyService>(&mut self, registered: bool, ctx: &mut HotkeyContext<S>) {
        if registered {
            self.registration.register(ctx);
        } else {
            self.registration.unregister(ctx);
        }
    }

    pub fn dispose<S: HotkeyService>(&mut self, ctx: &mut HotkeyContext<S>) {
        self.registration.dispose(ctx);
        self.binding = None;
    }

    /// Raise Pressed and fire the bound action if `message` is this hotkey's.
    ///
    /// Returns `None` when the message is not ours, else whether the press
    /// was handled by a subscriber or by the action.
    pub fn handle_message_at(&mut self, message: &HostMessage, at: Instant) -> Option<bool> {
        let event = self.registration.handle_message_at(message, at)?;
        let combo = event.combo.to_string();

        let Some(binding) = self.binding.as_mut() else {
            logging::log_press_event(&self.name, &combo, event.id, "unbound");
            return Some(event.handled);
        };

        let ctx = ActionContext {
            hotkey: &self.name,
            combo: event.combo,
            id: event.id,
            at: event.at,
            settings: &self.action_settings,
        };
        let outcome = binding.fire(&ctx);
        logging::log_press_event(&self.name, &combo, event.id, outcome.label());
        Some(event.handled || outcome.handled())
    }
}
