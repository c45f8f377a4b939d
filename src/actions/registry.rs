//! String identifier to handler mapping, populated from action groups.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::types::{FnAction, HotkeyAction};

/// A named set of actions registered together as `"<Group>.<Action>"`.
pub trait ActionGroup {
    fn name(&self) -> &str;

    /// (action name, handler) pairs, without the group prefix.
    fn actions(&self) -> Vec<(String, Arc<dyn HotkeyAction>)>;
}

#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn HotkeyAction>>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Joins the group and action names of an identifier.
pub const GROUP_SEPARATOR: char = '.';

/// Full identifier for `action` inside `group`.
pub fn action_identifier(group: &str, action: &str) -> String {
    format!("{}{}{}", group, GROUP_SEPARATOR, action)
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under `identifier`, replacing any previous handler.
    pub fn register(&mut self, identifier: impl Into<String>, action: Arc<dyn HotkeyAction>) {
        let identifier = identifier.into();
        if self.actions.insert(identifier.clone(), action).is_some() {
            debug!(action = %identifier, "Replaced registered action");
        }
    }

    pub fn register_fn(&mut self, identifier: impl Into<String>, action: FnAction) {
        self.register(identifier, Arc::new(action));
    }

    /// Register every action of `group`. Returns how many were added.
    pub fn register_group(&mut self, group: &dyn ActionGroup) -> usize {
        let actions = group.actions();
        let count = actions.len();
        for (name, action) in actions {
            self.register(action_identifier(group.name(), &name), action);
        }
        debug!(group = group.name(), count = count, "Registered action group");
        count
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<dyn HotkeyAction>> {
        self.actions.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.actions.contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
