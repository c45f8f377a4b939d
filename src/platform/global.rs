//! Hotkey service over the `global-hotkey` crate.
//!
//! `global-hotkey` derives its own `u32` ids from the combination, so this
//! service keeps a two-way map between those and the ids our allocator hands
//! out. Press events come back on the crate's global channel and are turned
//! into [`HostMessage`]s for the collection's dispatcher.

use std::collections::HashMap;
use std::time::Duration;

use global_hotkey::hotkey::{Code, HotKey, Modifiers as GhModifiers};
use global_hotkey::{Error as GhError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::debug;

use crate::hotkeys::{HostMessage, HotkeyService, Key, Modifiers, OsError, OwnerHandle};

/// Owner handle used for every registration made through this service.
pub const GLOBAL_OWNER: OwnerHandle = OwnerHandle(0);

// Win32 codes, reused so failures read the same on every backend.
const ERROR_HOTKEY_ALREADY_REGISTERED: i32 = 1409;
const ERROR_HOTKEY_NOT_REGISTERED: i32 = 1419;
const ERROR_UNMAPPED: i32 = -1;

pub struct GlobalHotkeyService {
    manager: GlobalHotKeyManager,
    owner: OwnerHandle,
    /// Our id -> registered HotKey (needed for unregistration)
    hotkeys: HashMap<u16, HotKey>,
    /// global-hotkey id -> our id
    native_to_id: HashMap<u32, u16>,
}

impl GlobalHotkeyService {
    /// NOTE: Must be created on the thread that runs the platform event loop.
    pub fn new() -> Result<Self, OsError> {
        let manager = GlobalHotKeyManager::new().map_err(os_error)?;
        Ok(Self {
            manager,
            owner: GLOBAL_OWNER,
            hotkeys: HashMap::new(),
            native_to_id: HashMap::new(),
        })
    }

    pub fn owner(&self) -> OwnerHandle {
        self.owner
    }

    /// Hotkey message for a press event, `None` for releases and foreign ids.
    pub fn translate(&self, event: &GlobalHotKeyEvent) -> Option<HostMessage> {
        // Only respond to key PRESS, not release
        if event.state != HotKeyState::Pressed {
            return None;
        }
        let id = self.native_to_id.get(&event.id).copied()?;
        Some(HostMessage::hotkey(self.owner, id))
    }

    /// Wait up to `timeout` for the next press.
    pub fn poll(&self, timeout: Duration) -> Option<HostMessage> {
        let event = GlobalHotKeyEvent::receiver().recv_timeout(timeout).ok()?;
        let message = self.translate(&event);
        if message.is_none() {
            debug!(native_id = event.id, state = ?event.state, "Ignoring hotkey event");
        }
        message
    }
}

impl HotkeyService for GlobalHotkeyService {
    fn register_hotkey(
        &mut self,
        _owner: OwnerHandle,
        id: u16,
        modifiers: Modifiers,
        key: Key,
    ) -> Result<(), OsError> {
        if self.hotkeys.contains_key(&id) {
            return Err(OsError::new(
                ERROR_HOTKEY_ALREADY_REGISTERED,
                format!("hotkey id {} is still in use", id),
            ));
        }
        let code = key_code(key).ok_or_else(|| {
            OsError::new(ERROR_UNMAPPED, format!("key {} is not supported by this backend", key))
        })?;
        let hotkey = HotKey::new(Some(to_native_modifiers(modifiers)), code);
        self.manager.register(hotkey).map_err(os_error)?;
        self.native_to_id.insert(hotkey.id(), id);
        self.hotkeys.insert(id, hotkey);
        Ok(())
    }

    fn unregister_hotkey(&mut self, _owner: OwnerHandle, id: u16) -> Result<(), OsError> {
        let hotkey = self.hotkeys.remove(&id).ok_or_else(|| {
            OsError::new(ERROR_HOTKEY_NOT_REGISTERED, "Hot key is not registered.")
        })?;
        self.native_to_id.remove(&hotkey.id());
        self.manager.unregister(hotkey).map_err(os_error)
    }
}

fn os_error(error: GhError) -> OsError {
    let code = match &error {
        GhError::AlreadyRegistered(_) => ERROR_HOTKEY_ALREADY_REGISTERED,
        GhError::FailedToUnRegister(_) => ERROR_HOTKEY_NOT_REGISTERED,
        GhError::OsError(e) => e.raw_os_error().unwrap_or(ERROR_UNMAPPED),
        _ => ERROR_UNMAPPED,
    };
    OsError::new(code, error.to_string())
}

/// NO_REPEAT has no counterpart here and is dropped.
pub fn to_native_modifiers(modifiers: Modifiers) -> GhModifiers {
    let mut native = GhModifiers::empty();
    if modifiers.contains(Modifiers::ALT) {
        native |= GhModifiers::ALT;
    }
    if modifiers.contains(Modifiers::CONTROL) {
        native |= GhModifiers::CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        native |= GhModifiers::SHIFT;
    }
    if modifiers.contains(Modifiers::SUPER) {
        native |= GhModifiers::SUPER;
    }
    native
}

/// `global-hotkey` key code for `key`, `None` for the sentinel.
pub fn key_code(key: Key) -> Option<Code> {
    let code = match key {
        Key::None => return None,
        Key::A => Code::KeyA,
        Key::B => Code::KeyB,
        Key::C => Code::KeyC,
        Key::D => Code::KeyD,
        Key::E => Code::KeyE,
        Key::F => Code::KeyF,
        Key::G => Code::KeyG,
        Key::H => Code::KeyH,
        Key::I => Code::KeyI,
        Key::J => Code::KeyJ,
        Key::K => Code::KeyK,
        Key::L => Code::KeyL,
        Key::M => Code::KeyM,
        Key::N => Code::KeyN,
        Key::O => Code::KeyO,
        Key::P => Code::KeyP,
        Key::Q => Code::KeyQ,
        Key::R => Code::KeyR,
        Key::S => Code::KeyS,
        Key::T => Code::KeyT,
        Key::U => Code::KeyU,
        Key::V => Code::KeyV,
        Key::W => Code::KeyW,
        Key::X => Code::KeyX,
        Key::Y => Code::KeyY,
        Key::Z => Code::KeyZ,
        Key::D0 => Code::Digit0,
        Key::D1 => Code::Digit1,
        Key::D2 => Code::Digit2,
        Key::D3 => Code::Digit3,
        Key::D4 => Code::Digit4,
        Key::D5 => Code::Digit5,
        Key::D6 => Code::Digit6,
        Key::D7 => Code::Digit7,
        Key::D8 => Code::Digit8,
        Key::D9 => Code::Digit9,
        // Function keys
        Key::F1 => Code::F1,
        Key::F2 => Code::F2,
        Key::F3 => Code::F3,
        Key::F4 => Code::F4,
        Key::F5 => Code::F5,
        Key::F6 => Code::F6,
        Key::F7 => Code::F7,
        Key::F8 => Code::F8,
        Key::F9 => Code::F9,
        Key::F10 => Code::F10,
        Key::F11 => Code::F11,
        Key::F12 => Code::F12,
        Key::F13 => Code::F13,
        Key::F14 => Code::F14,
        Key::F15 => Code::F15,
        Key::F16 => Code::F16,
        Key::F17 => Code::F17,
        Key::F18 => Code::F18,
        Key::F19 => Code::F19,
        Key::F20 => Code::F20,
        Key::F21 => Code::F21,
        Key::F22 => Code::F22,
        Key::F23 => Code::F23,
        Key::F24 => Code::F24,
        // Numpad
        Key::NumPad0 => Code::Numpad0,
        Key::NumPad1 => Code::Numpad1,
        Key::NumPad2 => Code::Numpad2,
        Key::NumPad3 => Code::Numpad3,
        Key::NumPad4 => Code::Numpad4,
        Key::NumPad5 => Code::Numpad5,
        Key::NumPad6 => Code::Numpad6,
        Key::NumPad7 => Code::Numpad7,
        Key::NumPad8 => Code::Numpad8,
        Key::NumPad9 => Code::Numpad9,
        Key::Multiply => Code::NumpadMultiply,
        Key::Add => Code::NumpadAdd,
        Key::Subtract => Code::NumpadSubtract,
        Key::Decimal => Code::NumpadDecimal,
        Key::Divide => Code::NumpadDivide,
        // Navigation and editing
        Key::Space => Code::Space,
        Key::Enter => Code::Enter,
        Key::Tab => Code::Tab,
        Key::Escape => Code::Escape,
        Key::Back => Code::Backspace,
        Key::Delete => Code::Delete,
        Key::Insert => Code::Insert,
        Key::Home => Code::Home,
        Key::End => Code::End,
        Key::PageUp => Code::PageUp,
        Key::PageDown => Code::PageDown,
        Key::Left => Code::ArrowLeft,
        Key::Up => Code::ArrowUp,
        Key::Right => Code::ArrowRight,
        Key::Down => Code::ArrowDown,
        Key::PrintScreen => Code::PrintScreen,
        Key::Pause => Code::Pause,
        // Media
        Key::VolumeMute => Code::AudioVolumeMute,
        Key::VolumeDown => Code::AudioVolumeDown,
        Key::VolumeUp => Code::AudioVolumeUp,
        Key::MediaNextTrack => Code::MediaTrackNext,
        Key::MediaPreviousTrack => Code::MediaTrackPrevious,
        Key::MediaStop => Code::MediaStop,
        Key::MediaPlayPause => Code::MediaPlayPause,
        // Punctuation
        Key::OemSemicolon => Code::Semicolon,
        Key::OemPlus => Code::Equal,
        Key::OemComma => Code::Comma,
        Key::OemMinus => Code::Minus,
        Key::OemPeriod => Code::Period,
        Key::OemQuestion => Code::Slash,
        Key::OemTilde => Code::Backquote,
        Key::OemOpenBrackets => Code::BracketLeft,
        Key::OemPipe => Code::Backslash,
        Key::OemCloseBrackets => Code::BracketRight,
        Key::OemQuotes => Code::Quote,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_but_none_has_a_code() {
        for key in Key::ALL {
            assert_eq!(key_code(*key).is_none(), key.is_none(), "{}", key);
        }
    }

    #[test]
    fn modifiers_map_without_no_repeat() {
        let native = to_native_modifiers(Modifiers::CONTROL | Modifiers::SHIFT | Modifiers::NO_REPEAT);
        assert_eq!(native, GhModifiers::CONTROL | GhModifiers::SHIFT);
        assert_eq!(to_native_modifiers(Modifiers::SUPER), GhModifiers::SUPER);
    }

    #[test]
    fn same_combination_has_stable_native_id() {
        let a = HotKey::new(Some(to_native_modifiers(Modifiers::ALT)), Code::KeyQ);
        let b = HotKey::new(Some(to_native_modifiers(Modifiers::ALT)), Code::KeyQ);
        assert_eq!(a.id(), b.id());
    }

    // GlobalHotKeyManager needs a desktop session and an event loop.
    #[cfg(feature = "system-tests")]
    #[test]
    fn registers_and_releases_real_hotkey() {
        let Ok(mut service) = GlobalHotkeyService::new() else {
            return;
        };
        let owner = service.owner();
        service
            .register_hotkey(owner, 1, Modifiers::CONTROL | Modifiers::ALT | Modifiers::SHIFT, Key::F19)
            .unwrap();
        assert!(service
            .register_hotkey(owner, 1, Modifiers::CONTROL, Key::F19)
            .is_err());
        service.unregister_hotkey(owner, 1).unwrap();
        assert!(service.unregister_hotkey(owner, 1).is_err());
    }
}
