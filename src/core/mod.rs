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

//! src/core/mod.rs
//!
//! Core key model
//!
//! This module contains the value types every other layer is built on:
//! - `Key`: a single named (`VirtualKey`) or text key
//! - `KeyCombination`: 1 to 4 distinct keys pressed together
//!
//! Both are immutable, parsed from the tokens used in the configuration
//! file, and render back to the same tokens.

pub mod combination;
pub mod key;

pub use combination::{CombinationError, KeyCombination, KEY_SEPARATOR, MAX_KEYS};
pub use key::{Key, KeyError, VirtualKey};

#[cfg(test)]
mod tests;
