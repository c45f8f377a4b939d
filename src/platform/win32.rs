//! Native Win32 hotkey service (`RegisterHotKey` / `WM_HOTKEY`).
//!
//! Owner handles are `HWND`s. `OwnerHandle(0)` registers thread hotkeys,
//! which Windows posts to the registering thread's queue with a null `hwnd`.

use std::ffi::c_void;

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
    MOD_SHIFT, MOD_WIN,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, IsWindow, TranslateMessage, MSG,
};

use crate::hotkeys::{HostMessage, HotkeyService, Key, Modifiers, OsError, OwnerHandle};

/// Owner used for thread-level registrations.
pub const THREAD_OWNER: OwnerHandle = OwnerHandle(0);

#[derive(Debug, Default)]
pub struct Win32HotkeyService;

impl Win32HotkeyService {
    pub fn new() -> Self {
        Self
    }
}

impl HotkeyService for Win32HotkeyService {
    fn register_hotkey(
        &mut self,
        owner: OwnerHandle,
        id: u16,
        modifiers: Modifiers,
        key: Key,
    ) -> Result<(), OsError> {
        // SAFETY: RegisterHotKey is an OS API. A stale HWND is reported as an error.
        unsafe {
            RegisterHotKey(
                hwnd(owner),
                i32::from(id),
                to_native_modifiers(modifiers),
                key.virtual_key(),
            )
        }
        .map_err(os_error)
    }

    fn unregister_hotkey(&mut self, owner: OwnerHandle, id: u16) -> Result<(), OsError> {
        // SAFETY: UnregisterHotKey is an OS API.
        unsafe { UnregisterHotKey(hwnd(owner), i32::from(id)) }.map_err(os_error)
    }

    fn is_owner_alive(&self, owner: OwnerHandle) -> bool {
        match hwnd(owner) {
            None => true,
            // SAFETY: IsWindow accepts any handle value.
            Some(hwnd) => unsafe { IsWindow(Some(hwnd)).as_bool() },
        }
    }
}

fn hwnd(owner: OwnerHandle) -> Option<HWND> {
    (owner != THREAD_OWNER).then(|| HWND(owner.0 as *mut c_void))
}

pub fn to_native_modifiers(modifiers: Modifiers) -> HOT_KEY_MODIFIERS {
    let mut native = HOT_KEY_MODIFIERS(0);
    if modifiers.contains(Modifiers::ALT) {
        native |= MOD_ALT;
    }
    if modifiers.contains(Modifiers::CONTROL) {
        native |= MOD_CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        native |= MOD_SHIFT;
    }
    if modifiers.contains(Modifiers::SUPER) {
        native |= MOD_WIN;
    }
    if modifiers.contains(Modifiers::NO_REPEAT) {
        native |= MOD_NOREPEAT;
    }
    native
}

/// Win32 error code out of an HRESULT built from one (`0x8007xxxx`).
fn os_error(error: windows::core::Error) -> OsError {
    let hresult = error.code().0;
    let code = if (hresult as u32) & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    };
    OsError::new(code, error.message())
}

pub fn host_message(msg: &MSG) -> HostMessage {
    HostMessage {
        owner: OwnerHandle(msg.hwnd.0 as isize),
        kind: msg.message,
        id: msg.wParam.0 as u16,
    }
}

fn deliver(msg: &MSG, filter: &mut impl FnMut(&HostMessage) -> bool) {
    if filter(&host_message(msg)) {
        return;
    }
    // SAFETY: msg was filled in by GetMessageW on this thread.
    unsafe {
        let _ = TranslateMessage(msg);
        let _ = DispatchMessageW(msg);
    }
}

/// Block for the next message and deliver it. Returns false on `WM_QUIT` or error.
pub fn wait_message(mut filter: impl FnMut(&HostMessage) -> bool) -> bool {
    let mut msg = MSG::default();
    // SAFETY: msg is a valid out-pointer for the duration of the call.
    let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
    if result.0 <= 0 {
        return false;
    }
    deliver(&msg, &mut filter);
    true
}
