//! Key combination value type: one primary key plus a modifier bitmask.
//!
//! Canonical string form is `Mod1+Mod2+...+Key` with modifiers in the fixed
//! order Alt, Ctrl, Shift, Win. Parsing is best effort and never fails: a
//! string without a recognisable key yields an invalid combination.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::key::Key;

bitflags! {
    /// Modifier bitmask, laid out as the OS hotkey service expects it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const ALT = 1 << 0;
        const CONTROL = 1 << 1;
        const SHIFT = 1 << 2;
        const SUPER = 1 << 3;
        /// Suppress OS auto-repeat where supported. A registration option
        /// (see `HotkeyRegistration::set_no_repeat`), never part of a
        /// [`KeyCombination`].
        const NO_REPEAT = 1 << 4;
    }
}

/// Display order and names of the renderable modifiers.
const MODIFIER_NAMES: [(Modifiers, &str); 4] = [
    (Modifiers::ALT, "Alt"),
    (Modifiers::CONTROL, "Ctrl"),
    (Modifiers::SHIFT, "Shift"),
    (Modifiers::SUPER, "Win"),
];

impl Modifiers {
    /// Parse a single modifier token (case-insensitive).
    pub fn from_token(token: &str) -> Option<Modifiers> {
        match token.to_ascii_lowercase().as_str() {
            "alt" => Some(Modifiers::ALT),
            "ctrl" | "control" => Some(Modifiers::CONTROL),
            "shift" => Some(Modifiers::SHIFT),
            "win" | "super" | "meta" => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

/// A primary key plus modifiers. Only the four renderable modifiers are
/// kept, so every combination survives its string form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    key: Key,
    modifiers: Modifiers,
}

impl KeyCombination {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers: modifiers - Modifiers::NO_REPEAT,
        }
    }

    /// Parse `"Ctrl+Shift+M"` style strings.
    ///
    /// Tokens are trimmed and empty ones dropped. Modifier names are matched
    /// case-insensitively; any other token is tried as the key name, and the
    /// last recognised key wins. Unrecognised tokens are ignored.
    pub fn parse(s: &str) -> Self {
        let mut combo = Self::default();
        for token in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(modifier) = Modifiers::from_token(token) {
                combo.modifiers |= modifier;
            } else if let Some(key) = Key::from_name(token) {
                combo.key = key;
            } else {
                debug!(token = token, input = s, "Ignoring unknown key token");
            }
        }
        combo
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// A combination can only be registered when it has a primary key.
    pub fn valid(&self) -> bool {
        !self.key.is_none()
    }

    /// Returns true when the value changed.
    pub fn set_key(&mut self, key: Key) -> bool {
        let changed = self.key != key;
        self.key = key;
        changed
    }

    /// Replace the whole modifier mask. Returns true when the value changed.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) -> bool {
        let modifiers = modifiers - Modifiers::NO_REPEAT;
        let changed = self.modifiers != modifiers;
        self.modifiers = modifiers;
        changed
    }

    /// Toggle one or more modifier bits. Returns true when the value changed.
    pub fn set_modifier(&mut self, modifier: Modifiers, enabled: bool) -> bool {
        let before = self.modifiers;
        self.modifiers.set(modifier - Modifiers::NO_REPEAT, enabled);
        before != self.modifiers
    }

    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CONTROL)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn win(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// Human-friendly form: empty for an invalid combination, canonical otherwise.
    pub fn display(&self) -> String {
        if self.valid() {
            self.to_string()
        } else {
            String::new()
        }
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (modifier, name) in MODIFIER_NAMES {
            if self.modifiers.contains(modifier) {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(self.key.name())
    }
}

impl FromStr for KeyCombination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for KeyCombination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyCombination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
