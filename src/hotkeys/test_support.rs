//! Test double for the OS hotkey service.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::combination::Modifiers;
use super::key::Key;
use super::service::{HotkeyContext, HotkeyService, OsError, OwnerHandle};

pub const OWNER: OwnerHandle = OwnerHandle(0x1001);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    Register { id: u16, modifiers: Modifiers, key: Key },
    Unregister { id: u16 },
}

#[derive(Debug, Default)]
pub struct ServiceState {
    pub calls: Vec<ServiceCall>,
    pub live: HashSet<u16>,
    /// Keys the OS refuses (already claimed by another application).
    pub taken_keys: HashSet<Key>,
    pub fail_unregister: bool,
    pub owner_destroyed: bool,
}

/// Records every call; shares its state so tests can inspect it after the
/// service has been moved into a context.
#[derive(Clone, Debug, Default)]
pub struct RecordingService {
    pub state: Rc<RefCell<ServiceState>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn register_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ServiceCall::Register { .. }))
            .count()
    }

    pub fn unregister_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ServiceCall::Unregister { .. }))
            .count()
    }

    pub fn live_ids(&self) -> HashSet<u16> {
        self.state.borrow().live.clone()
    }

    pub fn take_key(&self, key: Key) {
        self.state.borrow_mut().taken_keys.insert(key);
    }

    pub fn release_key(&self, key: Key) {
        self.state.borrow_mut().taken_keys.remove(&key);
    }

    pub fn set_fail_unregister(&self, fail: bool) {
        self.state.borrow_mut().fail_unregister = fail;
    }

    pub fn destroy_owner(&self) {
        self.state.borrow_mut().owner_destroyed = true;
    }
}

impl HotkeyService for RecordingService {
    fn register_hotkey(
        &mut self,
        _owner: OwnerHandle,
        id: u16,
        modifiers: Modifiers,
        key: Key,
    ) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(ServiceCall::Register { id, modifiers, key });
        if state.taken_keys.contains(&key) {
            return Err(OsError::new(1409, "Hot key is already registered."));
        }
        state.live.insert(id);
        Ok(())
    }

    fn unregister_hotkey(&mut self, _owner: OwnerHandle, id: u16) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(ServiceCall::Unregister { id });
        state.live.remove(&id);
        if state.fail_unregister {
            return Err(OsError::new(1419, "Hot key is not registered."));
        }
        Ok(())
    }

    fn is_owner_alive(&self, _owner: OwnerHandle) -> bool {
        !self.state.borrow().owner_destroyed
    }
}

/// Fresh context plus a handle onto the service's recorded state.
pub fn context() -> (HotkeyContext<RecordingService>, RecordingService) {
    let service = RecordingService::new();
    (HotkeyContext::new(service.clone(), OWNER), service)
}
