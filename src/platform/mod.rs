//! OS hotkey service implementations.
//!
//! - `global` - any desktop OS, through the `global-hotkey` crate
//! - `win32` - native `RegisterHotKey` with HWND owners (Windows only)

pub mod global;
#[cfg(windows)]
pub mod win32;

pub use global::{GlobalHotkeyService, GLOBAL_OWNER};
#[cfg(windows)]
pub use win32::{Win32HotkeyService, THREAD_OWNER};
