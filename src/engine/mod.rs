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

//! Remapping engine integration
//!
//! The engine that actually hooks the keyboard is an opaque component. This
//! module defines the boundary it is reached through ([`Engine`]) and the
//! [`LifecycleBridge`] that owns its handle and pushes a [`Configuration`]
//! into it.
//!
//! # Engines
//!
//! - [`DryRunEngine`]: in-memory engine that records every call and never
//!   touches the keyboard (default for tests and for the CLI)
//! - Native engines implement [`Engine`] on top of their own handle type
//!
//! # Example
//! ```
//! use another_keyboard_layer::config::{Configuration, DEFAULT_DOCUMENT};
//! use another_keyboard_layer::engine::{BridgeState, DryRunEngine, LifecycleBridge};
//!
//! let configuration = Configuration::from_document(DEFAULT_DOCUMENT)?;
//! let engine = DryRunEngine::new();
//! let recorder = engine.recorder();
//!
//! let mut bridge = LifecycleBridge::new(engine, configuration)?;
//! bridge.update()?;
//!
//! assert_eq!(bridge.state(), BridgeState::Running);
//! assert!(recorder.snapshot().running);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Configuration`]: crate::config::Configuration

pub mod bridge;
pub mod dry_run;

pub use bridge::{BridgeError, BridgeState, EngineSnapshot, LifecycleBridge};
pub use dry_run::{DryRunEngine, EngineCall, EngineRecorder, RecordedState};

use crate::core::{Key, KeyCombination};

/// Boundary operations of a remapping engine
///
/// The handle is owned by the caller and given back to [`Engine::destroy`]
/// by value, so it can only be released once. Error messages returned by
/// [`Engine::start`] and [`Engine::stop`] are engine-allocated and must be
/// handed back through [`Engine::release_error_message`].
///
/// Calls are synchronous and never issued concurrently for one handle.
pub trait Engine {
    /// Opaque engine state
    type Handle;
    /// Engine-owned error message buffer
    type ErrorMessage;

    /// Acquires a new handle; the engine is not running afterwards
    fn initialize(&mut self) -> Result<Self::Handle, String>;

    fn set_switch_key(&mut self, handle: &mut Self::Handle, key: Key);

    /// `None` disables the default combination
    fn set_default_combination(
        &mut self,
        handle: &mut Self::Handle,
        combination: Option<&KeyCombination>,
    );

    fn clear_mappings(&mut self, handle: &mut Self::Handle);

    fn add_mapping(
        &mut self,
        handle: &mut Self::Handle,
        source: &KeyCombination,
        replacement: &KeyCombination,
    );

    /// Starts remapping, returning an error message on failure
    fn start(&mut self, handle: &mut Self::Handle) -> Option<Self::ErrorMessage>;

    /// Stops remapping, returning an error message on failure
    fn stop(&mut self, handle: &mut Self::Handle) -> Option<Self::ErrorMessage>;

    fn is_running(&self, handle: &Self::Handle) -> bool;

    /// Copies the text out of an engine message without releasing it
    fn message_text(&self, message: &Self::ErrorMessage) -> String;

    fn release_error_message(&mut self, message: Self::ErrorMessage);

    /// Releases the handle
    fn destroy(&mut self, handle: Self::Handle);
}

#[cfg(test)]
mod tests;
