//! Hotkey Kit - system-wide hotkeys bound to named actions
//!
//! This library provides registration of global key combinations with the
//! OS, an observable ordered collection of named hotkeys, press dispatch to
//! debounced actions, and a delimited persistence format.

pub mod actions;
pub mod config;
pub mod error;
pub mod hotkeys;
pub mod logging;
pub mod platform;

pub use error::{HotkeyError, Result};
pub use hotkeys::{
    BindableHotkey, HotkeyCollection, HotkeyContext, HotkeyService, Key, KeyCombination,
    Modifiers,
};
