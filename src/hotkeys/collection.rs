//! The hotkey collection: owns every bindable hotkey, the OS context they
//! register through, and the dispatcher that routes hotkey messages to them.
//!
//! Entries live in a slot map addressed by [`HotkeyHandle`]; a `Vec` keeps
//! insertion order and a `HashMap<u16, HotkeyHandle>` maps live OS ids back
//! to entries. Every item-level change is persisted through the
//! [`HotkeyStore`] as soon as it is committed.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info};

use super::bindable::BindableHotkey;
use super::combination::{KeyCombination, Modifiers};
use super::key::Key;
use super::persistence::{HotkeyRecord, HotkeyStore};
use super::registration::{PressedEvent, RegistrationStatus, SubscriptionId};
use super::service::{HostMessage, HotkeyContext, HotkeyService, OwnerHandle};
use crate::actions::{ActionRegistry, ActionSetting};
use crate::config::{Config, DefaultHotkeyConfig, DEFAULT_DEBOUNCE_MS};
use crate::debug_panic;
use crate::error::{HotkeyError, Result, ResultExt};

new_key_type! {
    /// Stable handle to an entry of a [`HotkeyCollection`].
    pub struct HotkeyHandle;
}

/// Aggregate of the members' registered flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TriState {
    Checked,
    #[default]
    Unchecked,
    Indeterminate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionEvent {
    Added(HotkeyHandle),
    Removed(HotkeyHandle),
    Changed(HotkeyHandle),
    AllSelectedChanged(TriState),
}

pub type CollectionListener = Box<dyn FnMut(&CollectionEvent)>;

pub struct HotkeyCollection<S: HotkeyService, St: HotkeyStore> {
    ctx: HotkeyContext<S>,
    store: St,
    actions: ActionRegistry,
    debounce: Duration,
    entries: SlotMap<HotkeyHandle, BindableHotkey>,
    order: Vec<HotkeyHandle>,
    by_id: HashMap<u16, HotkeyHandle>,
    all_selected: TriState,
    // Set while a bulk operation drives per-item changes.
    bulk_update: bool,
    listeners: Vec<CollectionListener>,
    shut_down: bool,
}

impl<S: HotkeyService, St: HotkeyStore> fmt::Debug for HotkeyCollection<S, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyCollection")
            .field("owner", &self.ctx.owner())
            .field("entries", &self.iter().map(|(_, h)| h).collect::<Vec<_>>())
            .field("all_selected", &self.all_selected)
            .field("debounce", &self.debounce)
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

impl<S: HotkeyService, St: HotkeyStore> HotkeyCollection<S, St> {
    pub fn new(ctx: HotkeyContext<S>, store: St, actions: ActionRegistry) -> Self {
        HotkeyCollection {
            ctx,
            store,
            actions,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            entries: SlotMap::with_key(),
            order: Vec::new(),
            by_id: HashMap::new(),
            all_selected: TriState::Unchecked,
            bulk_update: false,
            listeners: Vec::new(),
            shut_down: false,
        }
    }

    /// Collection using the configured id range and debounce window.
    pub fn from_config(
        service: S,
        owner: OwnerHandle,
        store: St,
        actions: ActionRegistry,
        config: &Config,
    ) -> Result<Self> {
        let ctx = HotkeyContext::with_allocator(service, owner, config.id_allocator()?);
        Ok(Self::new(ctx, store, actions).with_debounce(config.get_debounce()))
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn owner(&self) -> OwnerHandle {
        self.ctx.owner()
    }

    pub fn context(&self) -> &HotkeyContext<S> {
        &self.ctx
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (HotkeyHandle, &BindableHotkey)> + '_ {
        self.order
            .iter()
            .filter_map(|handle| self.entries.get(*handle).map(|hotkey| (*handle, hotkey)))
    }

    pub fn handles(&self) -> Vec<HotkeyHandle> {
        self.order.clone()
    }

    pub fn get_by_handle(&self, handle: HotkeyHandle) -> Option<&BindableHotkey> {
        self.entries.get(handle)
    }

    /// First entry registered under `id`.
    pub fn get(&self, id: u16) -> Option<&BindableHotkey> {
        self.handle_of(id).and_then(|handle| self.entries.get(handle))
    }

    pub fn handle_of(&self, id: u16) -> Option<HotkeyHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<HotkeyHandle> {
        self.iter()
            .find(|(_, hotkey)| hotkey.name() == name)
            .map(|(handle, _)| handle)
    }

    pub fn on_changed(&mut self, listener: impl FnMut(&CollectionEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ============================================
    // STRUCTURE
    // ============================================

    /// Append `hotkey`, binding its action. Persists and recomputes the aggregate.
    pub fn add(&mut self, hotkey: BindableHotkey) -> HotkeyHandle {
        let handle = self.insert(hotkey, None);
        self.after_structure_change();
        handle
    }

    /// Build and append a hotkey, registering it right away when `register_now`.
    pub fn add_new(
        &mut self,
        name: impl Into<String>,
        combo: KeyCombination,
        action_id: Option<String>,
        register_now: bool,
    ) -> HotkeyHandle {
        let mut hotkey = BindableHotkey::new(name, combo, self.ctx.owner());
        hotkey.set_action(action_id);
        let handle = self.insert(hotkey, Some(register_now));
        self.after_structure_change();
        handle
    }

    /// Dispose and remove one entry. Returns the disposed hotkey.
    pub fn remove(&mut self, handle: HotkeyHandle) -> Option<BindableHotkey> {
        let hotkey = self.detach(handle)?;
        self.after_structure_change();
        Some(hotkey)
    }

    /// Dispose and remove every entry registered under `id`.
    pub fn remove_by_id(&mut self, id: u16) -> usize {
        let matching: Vec<HotkeyHandle> = self
            .iter()
            .filter(|(_, hotkey)| hotkey.id() == Some(id))
            .map(|(handle, _)| handle)
            .collect();
        let removed = matching
            .into_iter()
            .filter_map(|handle| self.detach(handle))
            .count();
        if removed > 0 {
            self.after_structure_change();
        }
        removed
    }

    /// Dispose and remove every entry, with a single save.
    pub fn remove_all(&mut self) {
        if self.order.is_empty() {
            return;
        }
        for handle in self.order.clone() {
            self.detach(handle);
        }
        info!(event_type = "hotkey_collection", action = "remove_all", "Removed all hotkeys");
        self.after_structure_change();
    }

    /// Remove everything, then install `defaults`. Saves once.
    pub fn reset(&mut self, defaults: &[DefaultHotkeyConfig]) -> Result<()> {
        self.bulk_update = true;
        self.remove_all();
        for default in defaults {
            let mut hotkey =
                BindableHotkey::new(default.name.clone(), default.combination(), self.ctx.owner());
            hotkey.set_action(default.action.clone());
            self.insert(hotkey, Some(default.registered));
        }
        self.bulk_update = false;
        self.rebuild_index();
        self.recompute_all_selected();
        info!(
            event_type = "hotkey_collection",
            action = "reset",
            count = defaults.len(),
            "Restored default hotkeys"
        );
        self.save()
    }

    // ============================================
    // PERSISTENCE
    // ============================================

    /// Append every saved hotkey, registering those saved as registered.
    /// Returns false when the store has nothing saved yet.
    ///
    /// Loading does not write back: a hotkey that fails to register keeps its
    /// saved flag and is retried on the next load.
    pub fn load(&mut self) -> Result<bool> {
        let Some(records) = self.store.load()? else {
            return Ok(false);
        };
        self.bulk_update = true;
        for record in records {
            let registered = record.registered;
            let hotkey = BindableHotkey::from_record(record, self.ctx.owner());
            self.insert(hotkey, Some(registered));
        }
        self.bulk_update = false;
        self.rebuild_index();
        self.recompute_all_selected();
        Ok(true)
    }

    pub fn records(&self) -> Vec<HotkeyRecord> {
        self.iter().map(|(_, hotkey)| hotkey.to_record()).collect()
    }

    pub fn save(&mut self) -> Result<()> {
        let records = self.records();
        self.store.save(&records)
    }

    // ============================================
    // AGGREGATE
    // ============================================

    pub fn all_selected(&self) -> TriState {
        self.all_selected
    }

    /// Force every member's registered flag, with one save at the end.
    pub fn set_all_selected(&mut self, selected: bool) {
        if self.bulk_update || (selected && self.shut_down) {
            return;
        }
        self.bulk_update = true;
        for handle in self.order.clone() {
            let Some(hotkey) = self.entries.get_mut(handle) else {
                continue;
            };
            let before = hotkey.status();
            hotkey.set_registered(selected, &mut self.ctx);
            if hotkey.status() != before {
                self.item_changed(handle);
            }
        }
        self.bulk_update = false;
        self.rebuild_index();
        self.recompute_all_selected();
        self.save().log_err();
    }

    // ============================================
    // EDITING
    // ============================================

    /// Batched edit of one entry. Changes apply when the guard is committed or
    /// dropped: at most one re-registration and one save.
    pub fn edit(&mut self, handle: HotkeyHandle) -> Result<HotkeyEdit<'_, S, St>> {
        if !self.entries.contains_key(handle) {
            return Err(HotkeyError::UnknownHotkey(format!("{:?}", handle)));
        }
        Ok(HotkeyEdit {
            collection: self,
            handle,
            pending: PendingEdit::default(),
        })
    }

    /// Subscribe to the raw Pressed notification of one entry.
    pub fn subscribe_pressed(
        &mut self,
        handle: HotkeyHandle,
        handler: impl FnMut(&mut PressedEvent) + 'static,
    ) -> Result<SubscriptionId> {
        let hotkey = self
            .entries
            .get_mut(handle)
            .ok_or_else(|| HotkeyError::UnknownHotkey(format!("{:?}", handle)))?;
        Ok(hotkey.registration_mut().on_pressed(handler))
    }

    pub fn unsubscribe_pressed(&mut self, handle: HotkeyHandle, subscription: SubscriptionId) -> bool {
        self.entries
            .get_mut(handle)
            .is_some_and(|hotkey| hotkey.registration_mut().unsubscribe(subscription))
    }

    // ============================================
    // DISPATCH
    // ============================================

    /// Message pre-filter. Returns whether the message was consumed.
    pub fn dispatch(&mut self, message: &HostMessage) -> bool {
        self.dispatch_at(message, Instant::now())
    }

    pub fn dispatch_at(&mut self, message: &HostMessage, at: Instant) -> bool {
        if self.shut_down || !message.is_hotkey() || message.owner != self.ctx.owner() {
            return false;
        }
        let Some(handle) = self.by_id.get(&message.id).copied() else {
            debug!(id = message.id, "Hotkey message for an unknown id");
            return false;
        };
        let Some(hotkey) = self.entries.get_mut(handle) else {
            debug_panic!("hotkey index points at a removed entry (id {})", message.id);
            return false;
        };
        hotkey.handle_message_at(message, at).unwrap_or(false)
    }

    // ============================================
    // TEARDOWN
    // ============================================

    /// Dispose every entry, releasing all OS hotkeys, without saving.
    /// Idempotent; also run on drop. Once shut down the collection registers
    /// nothing new.
    pub fn shutdown(&mut self) {
        for handle in &self.order {
            if let Some(hotkey) = self.entries.get_mut(*handle) {
                hotkey.dispose(&mut self.ctx);
            }
        }
        self.by_id.clear();
        if !self.shut_down {
            self.shut_down = true;
            info!(event_type = "hotkey_collection", action = "shutdown", "Hotkeys released");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ============================================
    // INTERNALS
    // ============================================

    fn insert(&mut self, mut hotkey: BindableHotkey, register: Option<bool>) -> HotkeyHandle {
        hotkey.bind(&self.actions, self.debounce);
        match register {
            Some(true) if self.shut_down => {
                debug!(hotkey = hotkey.name(), "Collection shut down, not registering");
            }
            Some(registered) => hotkey.set_registered(registered, &mut self.ctx),
            None => {}
        }
        debug!(
            event_type = "hotkey_collection",
            action = "add",
            hotkey = hotkey.name(),
            combo = %hotkey.combo(),
            status = ?hotkey.status(),
            "Hotkey added"
        );
        let handle = self.entries.insert(hotkey);
        self.order.push(handle);
        self.emit(CollectionEvent::Added(handle));
        handle
    }

    fn detach(&mut self, handle: HotkeyHandle) -> Option<BindableHotkey> {
        let mut hotkey = self.entries.remove(handle)?;
        hotkey.dispose(&mut self.ctx);
        self.order.retain(|h| *h != handle);
        debug!(
            event_type = "hotkey_collection",
            action = "remove",
            hotkey = hotkey.name(),
            "Hotkey removed"
        );
        self.emit(CollectionEvent::Removed(handle));
        Some(hotkey)
    }

    fn after_structure_change(&mut self) {
        self.rebuild_index();
        self.recompute_all_selected();
        if !self.bulk_update {
            self.save().log_err();
        }
    }

    /// Per-item change handler. Bulk operations recompute and save once
    /// themselves, so only the notification goes out while they run.
    fn item_changed(&mut self, handle: HotkeyHandle) {
        self.emit(CollectionEvent::Changed(handle));
        if self.bulk_update {
            return;
        }
        self.rebuild_index();
        self.recompute_all_selected();
    }

    fn rebuild_index(&mut self) {
        self.by_id.clear();
        for handle in &self.order {
            if let Some(id) = self.entries.get(*handle).and_then(BindableHotkey::id) {
                self.by_id.entry(id).or_insert(*handle);
            }
        }
    }

    fn compute_all_selected(&self) -> TriState {
        let mut registered = 0;
        let mut total = 0;
        for (_, hotkey) in self.iter() {
            total += 1;
            if hotkey.status() == RegistrationStatus::Registered {
                registered += 1;
            }
        }
        match registered {
            0 => TriState::Unchecked,
            n if n == total => TriState::Checked,
            _ => TriState::Indeterminate,
        }
    }

    fn recompute_all_selected(&mut self) {
        let state = self.compute_all_selected();
        if state != self.all_selected {
            self.all_selected = state;
            self.emit(CollectionEvent::AllSelectedChanged(state));
        }
    }

    fn emit(&mut self, event: CollectionEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

impl<S: HotkeyService, St: HotkeyStore> Drop for HotkeyCollection<S, St> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, Default)]
struct PendingEdit {
    name: Option<String>,
    combo: Option<KeyCombination>,
    action: Option<Option<String>>,
    settings: Option<Vec<ActionSetting>>,
    registered: Option<bool>,
}

impl PendingEdit {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.combo.is_none()
            && self.action.is_none()
            && self.settings.is_none()
            && self.registered.is_none()
    }
}

/// Guard returned by [`HotkeyCollection::edit`].
///
/// Setters only record the change. [`commit`](Self::commit) applies them and
/// reports the save result; dropping the guard commits whatever is still
/// pending and logs a failed save.
pub struct HotkeyEdit<'a, S: HotkeyService, St: HotkeyStore> {
    collection: &'a mut HotkeyCollection<S, St>,
    handle: HotkeyHandle,
    pending: PendingEdit,
}

impl<S: HotkeyService, St: HotkeyStore> HotkeyEdit<'_, S, St> {
    pub fn handle(&self) -> HotkeyHandle {
        self.handle
    }

    fn working_combo(&self) -> KeyCombination {
        self.pending.combo.unwrap_or_else(|| {
            self.collection
                .entries
                .get(self.handle)
                .map(BindableHotkey::combo)
                .unwrap_or_default()
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.pending.name = Some(name.into());
        self
    }

    pub fn set_combo(&mut self, combo: KeyCombination) -> &mut Self {
        self.pending.combo = Some(combo);
        self
    }

    pub fn set_key(&mut self, key: Key) -> &mut Self {
        let mut combo = self.working_combo();
        combo.set_key(key);
        self.set_combo(combo)
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) -> &mut Self {
        let mut combo = self.working_combo();
        combo.set_modifiers(modifiers);
        self.set_combo(combo)
    }

    pub fn set_modifier(&mut self, modifier: Modifiers, enabled: bool) -> &mut Self {
        let mut combo = self.working_combo();
        combo.set_modifier(modifier, enabled);
        self.set_combo(combo)
    }

    pub fn set_action(&mut self, action_id: Option<String>) -> &mut Self {
        self.pending.action = Some(action_id);
        self
    }

    pub fn set_settings(&mut self, settings: Vec<ActionSetting>) -> &mut Self {
        self.pending.settings = Some(settings);
        self
    }

    pub fn set_setting(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let mut settings = self.pending.settings.take().unwrap_or_else(|| {
            self.collection
                .entries
                .get(self.handle)
                .map(|h| h.action_settings().to_vec())
                .unwrap_or_default()
        });
        let value = value.into();
        match settings.iter_mut().find(|s| s.name == name) {
            Some(setting) => setting.value = value,
            None => settings.push(ActionSetting::new(name, value)),
        }
        self.pending.settings = Some(settings);
        self
    }

    pub fn set_registered(&mut self, registered: bool) -> &mut Self {
        self.pending.registered = Some(registered);
        self
    }

    /// Apply the pending changes now. Returns whether anything changed.
    pub fn commit(&mut self) -> Result<bool> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(false);
        }
        let collection = &mut *self.collection;
        let Some(hotkey) = collection.entries.get_mut(self.handle) else {
            return Err(HotkeyError::UnknownHotkey(format!("{:?}", self.handle)));
        };

        let status_before = hotkey.status();
        let mut changed = false;

        if let Some(name) = pending.name {
            changed |= hotkey.set_name(name);
        }
        let mut rebind = false;
        if let Some(action) = pending.action {
            rebind |= hotkey.set_action(action);
        }
        if let Some(settings) = pending.settings {
            rebind |= hotkey.set_settings(settings);
        }
        if rebind {
            hotkey.bind(&collection.actions, collection.debounce);
            changed = true;
        }
        if let Some(combo) = pending.combo {
            changed |= hotkey.registration_mut().set_combo(combo, &mut collection.ctx);
        }
        match pending.registered {
            Some(true) if collection.shut_down => {
                debug!(hotkey = hotkey.name(), "Collection shut down, not registering");
            }
            Some(registered) => hotkey.set_registered(registered, &mut collection.ctx),
            None => {}
        }
        changed |= hotkey.status() != status_before;

        if !changed {
            return Ok(false);
        }
        collection.item_changed(self.handle);
        if collection.bulk_update {
            return Ok(true);
        }
        collection.save()?;
        Ok(true)
    }
}

impl<S: HotkeyService, St: HotkeyStore> Drop for HotkeyEdit<'_, S, St> {
    fn drop(&mut self) {
        self.commit().log_err();
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
