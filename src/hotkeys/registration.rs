//! Per-hotkey registration state machine.
//!
//! - `Unregistered` -> `Registered` on a successful `register()`
//! - `Unregistered` -> `Failed` when the OS refuses
//! - `Registered` -> `Unregistered` on `unregister()`, or when the owner is gone
//! - `Registered` -> `Failed` when the OS refuses the unregister
//! - `Failed` -> `Unregistered` on `unregister()`, without an OS call
//!
//! OS failures never escape as errors: they move the registration to
//! `Failed` and are kept in [`HotkeyRegistration::last_error`].

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Instant;

use tracing::{debug, warn};

use super::combination::{KeyCombination, Modifiers};
use super::key::Key;
use super::service::{HostMessage, HotkeyContext, HotkeyService, OsError, OwnerHandle};
use crate::logging;

/// Lifecycle stage of a hotkey's OS-level claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegistrationStatus {
    #[default]
    Unregistered,
    Registered,
    Failed,
}

// The id lives inside the registered state so `id.is_some() <=> Registered`
// holds by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Unregistered,
    Registered(u16),
    Failed,
}

/// Payload of the Pressed notification. Subscribers set `handled` to claim it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PressedEvent {
    pub id: u16,
    pub combo: KeyCombination,
    pub at: Instant,
    pub handled: bool,
}

pub type PressedHandler = Box<dyn FnMut(&mut PressedEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One key combination and its OS registration.
pub struct HotkeyRegistration {
    combo: KeyCombination,
    owner: OwnerHandle,
    slot: Slot,
    last_error: Option<OsError>,
    no_repeat: bool,
    disposed: bool,
    subscribers: Vec<(SubscriptionId, PressedHandler)>,
    next_subscription: u64,
}

impl fmt::Debug for HotkeyRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyRegistration")
            .field("combo", &self.combo.to_string())
            .field("owner", &self.owner)
            .field("slot", &self.slot)
            .field("last_error", &self.last_error)
            .field("no_repeat", &self.no_repeat)
            .field("disposed", &self.disposed)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl HotkeyRegistration {
    /// Created unregistered; nothing is claimed until [`register`](Self::register).
    pub fn new(combo: KeyCombination, owner: OwnerHandle) -> Self {
        Self {
            combo,
            owner,
            slot: Slot::Unregistered,
            last_error: None,
            no_repeat: false,
            disposed: false,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn combo(&self) -> KeyCombination {
        self.combo
    }

    pub fn owner(&self) -> OwnerHandle {
        self.owner
    }

    pub fn status(&self) -> RegistrationStatus {
        match self.slot {
            Slot::Unregistered => RegistrationStatus::Unregistered,
            Slot::Registered(_) => RegistrationStatus::Registered,
            Slot::Failed => RegistrationStatus::Failed,
        }
    }

    /// OS id, present exactly while registered.
    pub fn id(&self) -> Option<u16> {
        match self.slot {
            Slot::Registered(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.slot, Slot::Registered(_))
    }

    pub fn no_repeat(&self) -> bool {
        self.no_repeat
    }

    /// Ask the OS to suppress auto-repeat. Applies from the next registration
    /// and is not persisted.
    pub fn set_no_repeat(&mut self, no_repeat: bool) {
        self.no_repeat = no_repeat;
    }

    fn requested_modifiers(&self) -> Modifiers {
        let mut modifiers = self.combo.modifiers();
        modifiers.set(Modifiers::NO_REPEAT, self.no_repeat);
        modifiers
    }

    /// Error from the most recent OS call that failed, kept for diagnostics.
    pub fn last_error(&self) -> Option<&OsError> {
        self.last_error.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Claim the combination from the OS.
    ///
    /// Already registered: returns the current id. Invalid combination: declines
    /// and leaves the registration `Unregistered`. OS refusal: `Failed`.
    pub fn register<S: HotkeyService>(&mut self, ctx: &mut HotkeyContext<S>) -> Option<u16> {
        if self.disposed {
            warn!(combo = %self.combo, "register() called on a disposed hotkey");
            return None;
        }
        if let Slot::Registered(id) = self.slot {
            return Some(id);
        }
        if !self.combo.valid() {
            debug!(combo = %self.combo, "Refusing to register a combination without a key");
            self.slot = Slot::Unregistered;
            return None;
        }

        let (service, allocator) = ctx.parts();
        let id = allocator.next();
        match service.register_hotkey(self.owner, id, self.requested_modifiers(), self.combo.key()) {
            Ok(()) => {
                self.slot = Slot::Registered(id);
                self.last_error = None;
                logging::log_registration_event(&self.combo.to_string(), Some(id), "register", None);
                Some(id)
            }
            Err(error) => {
                logging::log_registration_event(
                    &self.combo.to_string(),
                    Some(id),
                    "register",
                    Some(&error),
                );
                self.slot = Slot::Failed;
                self.last_error = Some(error);
                None
            }
        }
    }

    /// Release the OS claim.
    ///
    /// `Failed` clears straight to `Unregistered` without an OS call. When the
    /// owner has been destroyed the OS has already released the hotkey, so the
    /// call is skipped. A failed OS call leaves `Failed`; the claim is treated
    /// as lost either way.
    pub fn unregister<S: HotkeyService>(&mut self, ctx: &mut HotkeyContext<S>) {
        match self.slot {
            Slot::Unregistered => {}
            Slot::Failed => {
                self.slot = Slot::Unregistered;
            }
            Slot::Registered(id) => {
                let service = ctx.service_mut();
                if !service.is_owner_alive(self.owner) {
                    debug!(id = id, combo = %self.combo, "Owner destroyed, OS already released hotkey");
                    self.slot = Slot::Unregistered;
                    return;
                }
                match service.unregister_hotkey(self.owner, id) {
                    Ok(()) => {
                        logging::log_registration_event(
                            &self.combo.to_string(),
                            Some(id),
                            "unregister",
                            None,
                        );
                        self.slot = Slot::Unregistered;
                    }
                    Err(error) => {
                        logging::log_registration_event(
                            &self.combo.to_string(),
                            Some(id),
                            "unregister",
                            Some(&error),
                        );
                        self.slot = Slot::Failed;
                        self.last_error = Some(error);
                    }
                }
            }
        }
    }

    /// Unregister then register again under a fresh id. Aborts, leaving
    /// `Failed`, if the unregister half fails.
    pub fn reregister<S: HotkeyService>(&mut self, ctx: &mut HotkeyContext<S>) -> Option<u16> {
        self.unregister(ctx);
        if self.slot != Slot::Unregistered {
            warn!(combo = %self.combo, "Re-registration aborted: unregister failed");
            return None;
        }
        self.register(ctx)
    }

    /// Replace the combination. A registered hotkey is re-registered under the
    /// new combination; a failed one gets a fresh attempt if the new
    /// combination is valid. Returns true when the combination changed.
    pub fn set_combo<S: HotkeyService>(
        &mut self,
        combo: KeyCombination,
        ctx: &mut HotkeyContext<S>,
    ) -> bool {
        if combo == self.combo {
            return false;
        }
        self.combo = combo;
        if self.disposed {
            return true;
        }
        match self.slot {
            Slot::Registered(_) => {
                self.reregister(ctx);
            }
            Slot::Failed if combo.valid() => {
                self.register(ctx);
            }
            _ => {}
        }
        true
    }

    pub fn set_key<S: HotkeyService>(&mut self, key: Key, ctx: &mut HotkeyContext<S>) -> bool {
        let mut combo = self.combo;
        combo.set_key(key);
        self.set_combo(combo, ctx)
    }

    pub fn set_modifiers<S: HotkeyService>(
        &mut self,
        modifiers: Modifiers,
        ctx: &mut HotkeyContext<S>,
    ) -> bool {
        let mut combo = self.combo;
        combo.set_modifiers(modifiers);
        self.set_combo(combo, ctx)
    }

    pub fn set_modifier<S: HotkeyService>(
        &mut self,
        modifier: Modifiers,
        enabled: bool,
        ctx: &mut HotkeyContext<S>,
    ) -> bool {
        let mut combo = self.combo;
        combo.set_modifier(modifier, enabled);
        self.set_combo(combo, ctx)
    }

    /// Batched combination edit: change any number of fields through the
    /// guard; the registration reacts once when the guard drops.
    pub fn edit<'a, S: HotkeyService>(
        &'a mut self,
        ctx: &'a mut HotkeyContext<S>,
    ) -> ComboEdit<'a, S> {
        let combo = self.combo;
        ComboEdit {
            registration: self,
            ctx,
            combo,
        }
    }

    /// Unregister and retire. Idempotent; always ends `Unregistered`.
    pub fn dispose<S: HotkeyService>(&mut self, ctx: &mut HotkeyContext<S>) {
        if self.disposed {
            return;
        }
        self.unregister(ctx);
        if self.slot == Slot::Failed {
            // The claim is gone either way; clear the failure.
            self.unregister(ctx);
        }
        self.subscribers.clear();
        self.disposed = true;
    }

    pub fn on_pressed(&mut self, handler: impl FnMut(&mut PressedEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        before != self.subscribers.len()
    }

    /// Message-filter entry point. Returns whether a subscriber handled it.
    pub fn handle_message(&mut self, message: &HostMessage) -> bool {
        self.handle_message_at(message, Instant::now())
            .is_some_and(|event| event.handled)
    }

    /// Raise Pressed if `message` is this registration's hotkey notification.
    /// Returns the event after every subscriber has seen it, or `None` when
    /// the message is not ours.
    pub fn handle_message_at(&mut self, message: &HostMessage, at: Instant) -> Option<PressedEvent> {
        if !message.is_hotkey() {
            return None;
        }
        let Slot::Registered(id) = self.slot else {
            return None;
        };
        if message.id != id {
            return None;
        }

        let mut event = PressedEvent {
            id,
            combo: self.combo,
            at,
            handled: false,
        };
        for (_, handler) in self.subscribers.iter_mut() {
            handler(&mut event);
        }
        Some(event)
    }
}

/// Guard returned by [`HotkeyRegistration::edit`]. Derefs to a working copy of
/// the combination and applies it on drop.
pub struct ComboEdit<'a, S: HotkeyService> {
    registration: &'a mut HotkeyRegistration,
    ctx: &'a mut HotkeyContext<S>,
    combo: KeyCombination,
}

impl<S: HotkeyService> Deref for ComboEdit<'_, S> {
    type Target = KeyCombination;

    fn deref(&self) -> &KeyCombination {
        &self.combo
    }
}

impl<S: HotkeyService> DerefMut for ComboEdit<'_, S> {
    fn deref_mut(&mut self) -> &mut KeyCombination {
        &mut self.combo
    }
}

impl<S: HotkeyService> Drop for ComboEdit<'_, S> {
    fn drop(&mut self) {
        self.registration.set_combo(self.combo, self.ctx);
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
