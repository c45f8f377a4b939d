//! Binding of a hotkey's press to a registered action, with press de-duplication.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use super::registry::ActionRegistry;
use super::types::{ActionContext, ActionSetting, HotkeyAction};

/// Suppresses a repeat within `window` of the last accepted press.
///
/// Suppressed presses do not move the window, so auto-repeat cannot keep an
/// action from ever firing again.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_fired: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            last_fired: None,
        }
    }

    /// Whether a press at `now` should go through. Records it if so.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.window {
                trace!("Press debounced");
                return false;
            }
        }
        self.last_fired = Some(now);
        true
    }
}

/// What happened when a binding was fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The action ran and reported whether it handled the press.
    Invoked(bool),
    /// Dropped by the debouncer.
    Debounced,
}

impl FireOutcome {
    /// A debounced press counts as handled: it belonged to this hotkey.
    pub fn handled(self) -> bool {
        match self {
            FireOutcome::Invoked(handled) => handled,
            FireOutcome::Debounced => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FireOutcome::Invoked(true) => "handled",
            FireOutcome::Invoked(false) => "not handled",
            FireOutcome::Debounced => "debounced",
        }
    }
}

/// A resolved action plus the debounce state of the hotkey it is bound to.
#[derive(Clone)]
pub struct ActionBinding {
    action_id: String,
    action: Arc<dyn HotkeyAction>,
    debouncer: Debouncer,
}

impl fmt::Debug for ActionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBinding")
            .field("action_id", &self.action_id)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl ActionBinding {
    pub fn new(action_id: impl Into<String>, action: Arc<dyn HotkeyAction>, window: Duration) -> Self {
        ActionBinding {
            action_id: action_id.into(),
            action,
            debouncer: Debouncer::new(window),
        }
    }

    /// Look `action_id` up in `registry` and bind it. Declared settings that
    /// `settings` lacks are appended with their defaults.
    ///
    /// Returns `None` for identifiers the registry does not know.
    pub fn resolve(
        registry: &ActionRegistry,
        action_id: &str,
        settings: &mut Vec<ActionSetting>,
        window: Duration,
    ) -> Option<Self> {
        let action = registry.get(action_id)?;
        fill_default_settings(action.as_ref(), settings);
        Some(Self::new(action_id, action, window))
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn action(&self) -> &Arc<dyn HotkeyAction> {
        &self.action
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Run the action unless the press falls inside the debounce window.
    pub fn fire(&mut self, ctx: &ActionContext<'_>) -> FireOutcome {
        if !self.debouncer.should_fire(ctx.at) {
            return FireOutcome::Debounced;
        }
        FireOutcome::Invoked(self.action.invoke(ctx))
    }
}

/// Append defaults for every declared setting missing from `settings`.
/// Returns true if anything was added.
pub fn fill_default_settings(action: &dyn HotkeyAction, settings: &mut Vec<ActionSetting>) -> bool {
    let mut added = false;
    for spec in action.settings() {
        if !settings.iter().any(|s| s.name == spec.name) {
            settings.push(spec.default_setting());
            added = true;
        }
    }
    added
}
