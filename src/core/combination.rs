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

//! src/core/combination.rs
//!
//! Key combinations (simultaneous presses of 1 to 4 distinct keys)
//!
//! # Hash Implementation
//! Equality and hashing are based on a **sorted** copy of the keys, so
//! `Shift+v` and `v+Shift` are the same combination and land in the same
//! HashMap bucket. Display keeps the order the keys were given in, which
//! means two equal combinations can render differently.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

use crate::core::key::{Key, KeyError};

/// Separator between keys in a combination token
pub const KEY_SEPARATOR: char = '+';

/// Maximum number of keys in one combination
pub const MAX_KEYS: usize = 4;

/// Errors produced when a combination cannot be built or parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombinationError {
    /// Input was empty or only whitespace
    #[error("Key combination can't be empty")]
    Empty,

    /// More than four keys were given
    #[error("Key combination has {0} keys, at most 4 are allowed")]
    TooManyKeys(usize),

    /// One of the parts is not a valid key
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// The same key appears twice
    #[error("Key '{0}' is used more than once in the combination")]
    DuplicateKey(Key),
}

/// An unordered, duplicate-free set of 1 to 4 keys
#[derive(Clone, Debug)]
pub struct KeyCombination {
    /// Keys in construction order (used for display only)
    keys: Vec<Key>,
}

impl KeyCombination {
    /// Build a combination from already parsed keys
    ///
    /// # Errors
    /// * `CombinationError::Empty` - no keys given
    /// * `CombinationError::TooManyKeys` - more than four keys
    /// * `CombinationError::DuplicateKey` - a key appears twice
    pub fn new(keys: Vec<Key>) -> Result<Self, CombinationError> {
        if keys.is_empty() {
            return Err(CombinationError::Empty);
        }

        if keys.len() > MAX_KEYS {
            return Err(CombinationError::TooManyKeys(keys.len()));
        }

        for (idx, key) in keys.iter().enumerate() {
            if keys[..idx].contains(key) {
                return Err(CombinationError::DuplicateKey(*key));
            }
        }

        Ok(Self { keys })
    }

    /// Parse a `+` separated combination token such as `Shift+v`
    ///
    /// Empty parts (from `"+"`, `"Shift+"` or `"a++b"`) fail as invalid keys.
    pub fn parse(raw: &str) -> Result<Self, CombinationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CombinationError::Empty);
        }

        let parts: Vec<&str> = trimmed.split(KEY_SEPARATOR).collect();
        if parts.len() > MAX_KEYS {
            return Err(CombinationError::TooManyKeys(parts.len()));
        }

        let keys = parts
            .into_iter()
            .map(Key::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(keys)
    }

    /// Keys in the order they were supplied
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; a combination holds at least one key
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// Keys in canonical (sorted) order
    fn canonical(&self) -> Vec<Key> {
        let mut sorted = self.keys.clone();
        sorted.sort();
        sorted
    }
}

impl PartialEq for KeyCombination {
    fn eq(&self, other: &Self) -> bool {
        self.keys.len() == other.keys.len() && self.canonical() == other.canonical()
    }
}

impl Eq for KeyCombination {}

impl Hash for KeyCombination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl FromStr for KeyCombination {
    type Err = CombinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyCombination::parse(s)
    }
}

impl From<Key> for KeyCombination {
    fn from(key: Key) -> Self {
        Self { keys: vec![key] }
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string());
        f.write_str(&joined)
    }
}
