//! Boundary to the operating system's global hotkey facility.

use thiserror::Error;

use super::combination::Modifiers;
use super::id_allocator::IdAllocator;
use super::key::Key;

/// Message type the OS uses to report a hotkey press (Win32 `WM_HOTKEY`).
pub const HOTKEY_MESSAGE: u32 = 0x0312;

/// Error reported by the OS when it declines a register/unregister call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("OS error {code}: {message}")]
pub struct OsError {
    pub code: i32,
    pub message: String,
}

impl OsError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Opaque handle to the window or message loop that owns registrations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OwnerHandle(pub isize);

/// A message delivered to the owner context by the host's message pump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostMessage {
    pub owner: OwnerHandle,
    pub kind: u32,
    /// Hotkey id carried by the message payload.
    pub id: u16,
}

impl HostMessage {
    /// A hotkey-press notification for `id`.
    pub fn hotkey(owner: OwnerHandle, id: u16) -> Self {
        Self {
            owner,
            kind: HOTKEY_MESSAGE,
            id,
        }
    }

    pub fn is_hotkey(&self) -> bool {
        self.kind == HOTKEY_MESSAGE
    }
}

/// Platform primitives for claiming and releasing global hotkeys.
///
/// Implementations must be called from the thread that owns `owner`; nothing
/// in this crate locks around them.
pub trait HotkeyService {
    fn register_hotkey(
        &mut self,
        owner: OwnerHandle,
        id: u16,
        modifiers: Modifiers,
        key: Key,
    ) -> Result<(), OsError>;

    fn unregister_hotkey(&mut self, owner: OwnerHandle, id: u16) -> Result<(), OsError>;

    /// Whether the owner still exists. The OS drops every registration of a
    /// destroyed owner by itself, so no unregister call is needed then.
    fn is_owner_alive(&self, _owner: OwnerHandle) -> bool {
        true
    }
}

impl<T: HotkeyService + ?Sized> HotkeyService for Box<T> {
    fn register_hotkey(
        &mut self,
        owner: OwnerHandle,
        id: u16,
        modifiers: Modifiers,
        key: Key,
    ) -> Result<(), OsError> {
        (**self).register_hotkey(owner, id, modifiers, key)
    }

    fn unregister_hotkey(&mut self, owner: OwnerHandle, id: u16) -> Result<(), OsError> {
        (**self).unregister_hotkey(owner, id)
    }

    fn is_owner_alive(&self, owner: OwnerHandle) -> bool {
        (**self).is_owner_alive(owner)
    }
}

/// Everything a registration needs to talk to the OS: the service, the id
/// allocator shared by all registrations of one owner, and the owner itself.
#[derive(Debug)]
pub struct HotkeyContext<S> {
    service: S,
    allocator: IdAllocator,
    owner: OwnerHandle,
}

impl<S: HotkeyService> HotkeyContext<S> {
    pub fn new(service: S, owner: OwnerHandle) -> Self {
        Self::with_allocator(service, owner, IdAllocator::new())
    }

    pub fn with_allocator(service: S, owner: OwnerHandle, allocator: IdAllocator) -> Self {
        Self {
            service,
            allocator,
            owner,
        }
    }

    pub fn owner(&self) -> OwnerHandle {
        self.owner
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn allocator_mut(&mut self) -> &mut IdAllocator {
        &mut self.allocator
    }

    pub(crate) fn parts(&mut self) -> (&mut S, &mut IdAllocator) {
        (&mut self.service, &mut self.allocator)
    }
}
