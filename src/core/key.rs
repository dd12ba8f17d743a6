// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/key.rs
//!
//! Single keyboard keys
//!
//! A key is either a *virtual* key (a named, non-printable key such as an
//! arrow, a modifier or a function key) or a *text* key identified by the
//! single character it produces.
//!
//! Key tokens are parsed case-sensitively: `Shift` is a virtual key, while
//! `shift` is neither a named key nor a single character and is rejected.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when a key token cannot be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Token contains a whitespace character
    #[error("Invalid key '{0}': keys must not contain whitespace")]
    ContainsWhitespace(String),

    /// Token is neither a named key nor exactly one character
    #[error("Invalid key '{0}': not a known named key and not a single character")]
    Unknown(String),
}

macro_rules! virtual_keys {
    ($($name:ident),* $(,)?) => {
        /// Named keys that don't produce text when pressed
        ///
        /// Variant names double as the canonical token used in the
        /// configuration file.
        #[allow(missing_docs)]
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum VirtualKey {
            $($name,)*
        }

        impl VirtualKey {
            /// Every named key, in declaration order
            pub const ALL: &'static [VirtualKey] = &[$(VirtualKey::$name,)*];

            /// Canonical configuration-file name of this key
            pub fn name(self) -> &'static str {
                match self {
                    $(VirtualKey::$name => stringify!($name),)*
                }
            }

            /// Case-sensitive lookup by canonical name
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($name) => Some(VirtualKey::$name),)*
                    _ => None,
                }
            }
        }
    };
}

virtual_keys!(
    Back,
    Tab,
    Clear,
    Return,
    Shift,
    Control,
    Menu,
    Pause,
    Capital,
    Kana,
    Hangul,
    ImeOn,
    Junja,
    Final,
    Hanja,
    Kanji,
    ImeOff,
    Escape,
    Convert,
    Nonconvert,
    Accept,
    Modechange,
    Space,
    Prior,
    Next,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Select,
    Print,
    Execute,
    Snapshot,
    Insert,
    Delete,
    Help,
    LWin,
    RWin,
    Apps,
    Sleep,
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    Multiply,
    Add,
    Separator,
    Subtract,
    Decimal,
    Divide,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    Numlock,
    Scroll,
    LShift,
    RShift,
    LControl,
    RControl,
    LMenu,
    RMenu,
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserSearch,
    BrowserFavorites,
    BrowserHome,
    VolumeMute,
    VolumeDown,
    VolumeUp,
    MediaNextTrack,
    MediaPrevTrack,
    MediaStop,
    MediaPlayPause,
    LaunchMail,
    LaunchMediaSelect,
    LaunchApp1,
    LaunchApp2,
    Processkey,
    Play,
    Zoom,
);

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single keyboard key
///
/// Equality and hashing consider both the variant and its payload, so
/// `Text('a')` and `Text('A')` are different keys.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Key {
    /// Named key such as `Shift` or `F5`
    Virtual(VirtualKey),
    /// Key that produces exactly this character
    Text(char),
}

impl Key {
    /// Parse a key token
    ///
    /// Named keys take precedence over text keys, which only matters for
    /// single-letter names (none exist in the table today).
    ///
    /// # Errors
    /// * `KeyError::ContainsWhitespace` - token contains any whitespace
    /// * `KeyError::Unknown` - token is not a named key and not one character
    pub fn parse(token: &str) -> Result<Self, KeyError> {
        if token.chars().any(char::is_whitespace) {
            return Err(KeyError::ContainsWhitespace(token.to_string()));
        }

        if let Some(virtual_key) = VirtualKey::from_name(token) {
            return Ok(Key::Virtual(virtual_key));
        }

        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Key::Text(ch)),
            _ => Err(KeyError::Unknown(token.to_string())),
        }
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s)
    }
}

impl From<VirtualKey> for Key {
    fn from(value: VirtualKey) -> Self {
        Key::Virtual(value)
    }
}

impl From<char> for Key {
    fn from(value: char) -> Self {
        Key::Text(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Virtual(virtual_key) => write!(f, "{}", virtual_key),
            Key::Text(ch) => write!(f, "{}", ch),
        }
    }
}
