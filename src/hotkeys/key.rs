//! Primary keys a hotkey can be bound to.
//!
//! Each key has a canonical name (used in the persisted combination string),
//! optional parse aliases and its Win32 virtual-key code.

use std::fmt;

macro_rules! define_keys {
    ($( $variant:ident = $vk:literal $(| $alias:literal)* ),* $(,)?) => {
        /// A keyboard key. `Key::None` is the "no key" sentinel of an invalid combination.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Key {
            $( $variant, )*
        }

        impl Key {
            /// Every key, in declaration order (starts with `None`).
            pub const ALL: &'static [Key] = &[ $( Key::$variant, )* ];

            /// Canonical name, as written in combination strings.
            pub fn name(self) -> &'static str {
                match self {
                    $( Key::$variant => stringify!($variant), )*
                }
            }

            /// Win32 virtual-key code (`0` for `None`).
            pub fn virtual_key(self) -> u32 {
                match self {
                    $( Key::$variant => $vk, )*
                }
            }

            /// Case-insensitive lookup by canonical name or alias.
            pub fn from_name(name: &str) -> Option<Key> {
                let name = name.trim();
                $(
                    if name.eq_ignore_ascii_case(stringify!($variant))
                        $( || name.eq_ignore_ascii_case($alias) )*
                    {
                        return Some(Key::$variant);
                    }
                )*
                None
            }
        }
    };
}

define_keys! {
    None = 0x00,
    A = 0x41, B = 0x42, C = 0x43, D = 0x44, E = 0x45, F = 0x46, G = 0x47,
    H = 0x48, I = 0x49, J = 0x4A, K = 0x4B, L = 0x4C, M = 0x4D, N = 0x4E,
    O = 0x4F, P = 0x50, Q = 0x51, R = 0x52, S = 0x53, T = 0x54, U = 0x55,
    V = 0x56, W = 0x57, X = 0x58, Y = 0x59, Z = 0x5A,
    D0 = 0x30 | "0", D1 = 0x31 | "1", D2 = 0x32 | "2", D3 = 0x33 | "3", D4 = 0x34 | "4",
    D5 = 0x35 | "5", D6 = 0x36 | "6", D7 = 0x37 | "7", D8 = 0x38 | "8", D9 = 0x39 | "9",
    F1 = 0x70, F2 = 0x71, F3 = 0x72, F4 = 0x73, F5 = 0x74, F6 = 0x75,
    F7 = 0x76, F8 = 0x77, F9 = 0x78, F10 = 0x79, F11 = 0x7A, F12 = 0x7B,
    F13 = 0x7C, F14 = 0x7D, F15 = 0x7E, F16 = 0x7F, F17 = 0x80, F18 = 0x81,
    F19 = 0x82, F20 = 0x83, F21 = 0x84, F22 = 0x85, F23 = 0x86, F24 = 0x87,
    NumPad0 = 0x60, NumPad1 = 0x61, NumPad2 = 0x62, NumPad3 = 0x63, NumPad4 = 0x64,
    NumPad5 = 0x65, NumPad6 = 0x66, NumPad7 = 0x67, NumPad8 = 0x68, NumPad9 = 0x69,
    Multiply = 0x6A, Add = 0x6B, Subtract = 0x6D, Decimal = 0x6E, Divide = 0x6F,
    Space = 0x20,
    Enter = 0x0D | "Return",
    Tab = 0x09,
    Escape = 0x1B | "Esc",
    Back = 0x08 | "Backspace",
    Delete = 0x2E | "Del",
    Insert = 0x2D | "Ins",
    Home = 0x24,
    End = 0x23,
    PageUp = 0x21 | "PgUp" | "Prior",
    PageDown = 0x22 | "PgDn" | "Next",
    Left = 0x25 | "ArrowLeft",
    Up = 0x26 | "ArrowUp",
    Right = 0x27 | "ArrowRight",
    Down = 0x28 | "ArrowDown",
    PrintScreen = 0x2C | "Snapshot" | "PrtSc",
    Pause = 0x13,
    VolumeMute = 0xAD,
    VolumeDown = 0xAE,
    VolumeUp = 0xAF,
    MediaNextTrack = 0xB0,
    MediaPreviousTrack = 0xB1,
    MediaStop = 0xB2,
    MediaPlayPause = 0xB3,
    OemSemicolon = 0xBA | "Oem1" | "Semicolon",
    OemPlus = 0xBB | "Equal",
    OemComma = 0xBC | "Comma",
    OemMinus = 0xBD | "Minus",
    OemPeriod = 0xBE | "Period",
    OemQuestion = 0xBF | "Oem2" | "Slash",
    OemTilde = 0xC0 | "Oem3" | "Backquote",
    OemOpenBrackets = 0xDB | "Oem4" | "BracketLeft",
    OemPipe = 0xDC | "Oem5" | "Backslash",
    OemCloseBrackets = 0xDD | "Oem6" | "BracketRight",
    OemQuotes = 0xDE | "Oem7" | "Quote",
}

impl Default for Key {
    fn default() -> Self {
        Key::None
    }
}

impl Key {
    pub fn is_none(self) -> bool {
        self == Key::None
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
