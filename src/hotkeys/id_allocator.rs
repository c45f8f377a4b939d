//! Identifier allocation for OS hotkey registrations.

use crate::error::{HotkeyError, Result};

/// Lowest id handed to the OS.
pub const MIN_HOTKEY_ID: u16 = 0x0000;
/// Exclusive upper bound of the application hotkey-id range on Windows.
pub const MAX_HOTKEY_ID: u16 = 0xBFFF;

/// Hands out hotkey ids from `(min, max)`, wrapping back to the start when exhausted.
///
/// The counter does not track which ids are live. A wrapped id can only collide
/// with a registration that has stayed alive for a full cycle of the range.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    min: u16,
    max: u16,
    current: u16,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            min: MIN_HOTKEY_ID,
            max: MAX_HOTKEY_ID,
            current: MIN_HOTKEY_ID,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator over a custom range. `max` is exclusive and must leave room
    /// for at least one id above `min`.
    pub fn with_bounds(min: u16, max: u16) -> Result<Self> {
        if max <= min.saturating_add(1) {
            return Err(HotkeyError::InvalidIdRange { min, max });
        }
        Ok(Self {
            min,
            max,
            current: min,
        })
    }

    /// Next id. Increments before returning, so the first call yields `min + 1`.
    pub fn next(&mut self) -> u16 {
        if self.current + 1 >= self.max {
            self.current = self.min;
        }
        self.current += 1;
        self.current
    }

    pub fn bounds(&self) -> (u16, u16) {
        (self.min, self.max)
    }
}
