//! Global hotkey registration and dispatch.
//!
//! # Module Structure
//!
//! - `id_allocator` - bounded, wrapping id source for OS registrations
//! - `key` / `combination` - key enumeration and `Mod+Mod+Key` combinations
//! - `service` - the OS hotkey service contract and the context bundling it
//! - `registration` - per-hotkey register/unregister state machine
//! - `bindable` - named hotkey with an action binding
//! - `persistence` - delimited record format and stores
//! - `collection` - ordered collection, aggregate state and dispatcher

mod bindable;
mod collection;
mod combination;
mod id_allocator;
mod key;
mod persistence;
mod registration;
mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use bindable::BindableHotkey;
pub use collection::{
    CollectionEvent, CollectionListener, HotkeyCollection, HotkeyEdit, HotkeyHandle, TriState,
};
pub use combination::{KeyCombination, Modifiers};
pub use id_allocator::{IdAllocator, MAX_HOTKEY_ID, MIN_HOTKEY_ID};
pub use key::Key;
pub use persistence::{HotkeyRecord, HotkeyStore, JsonFileStore, MemoryStore};
pub use registration::{
    ComboEdit, HotkeyRegistration, PressedEvent, PressedHandler, RegistrationStatus,
    SubscriptionId,
};
pub use service::{
    HostMessage, HotkeyContext, HotkeyService, OsError, OwnerHandle, HOTKEY_MESSAGE,
};
