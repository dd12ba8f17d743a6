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

//! Another Keyboard Layer
//!
//! Configures a key-remapping engine from a TOML document and keeps the
//! running engine in sync with that document while it changes on disk.
//!
//! # Features
//!
//! - **Key model:** Named and text keys, combinations of up to four keys
//!   that compare equal regardless of key order
//! - **Validated config:** Every key in the document is checked before
//!   anything reaches the engine
//! - **First-run bootstrap:** A commented default config is written when
//!   none exists
//! - **Live reload:** Edits are applied to the running engine; invalid edits
//!   are reported and the last good config stays active
//! - **Single instance:** Only one process hooks the keyboard at a time
//!
//! # Architecture
//!
//! - **`core`:** Key and key combination value types
//! - **`config`:** Document parsing, validation, loading and saving
//! - **`engine`:** Engine boundary trait and the lifecycle bridge
//! - **`reload`:** File watching and serialised reconfiguration
//! - **`instance`:** Process-wide single-instance guard
//!
//! # Examples
//!
//! ## Parsing a combination
//!
//! ```
//! use another_keyboard_layer::core::KeyCombination;
//!
//! let first = KeyCombination::parse("Control+Shift+a")?;
//! let second = KeyCombination::parse("a+Control+Shift")?;
//!
//! assert_eq!(first, second);
//! assert_eq!(second.to_string(), "a+Control+Shift");
//! # Ok::<(), another_keyboard_layer::core::CombinationError>(())
//! ```
//!
//! ## Running a layer
//!
//! ```no_run
//! use another_keyboard_layer::config::ConfigurationProvider;
//! use another_keyboard_layer::engine::{DryRunEngine, LifecycleBridge};
//!
//! let provider = ConfigurationProvider::load_from_default_location()?;
//! let mut bridge = LifecycleBridge::new(DryRunEngine::new(), provider.configuration().clone())?;
//! bridge.update()?;
//! // ...
//! bridge.destroy();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod instance;
pub mod reload;

// Re-export commonly used types for convenience
pub use config::{Configuration, ConfigurationProvider};
pub use core::{Key, KeyCombination, VirtualKey};
pub use engine::{Engine, LifecycleBridge};
