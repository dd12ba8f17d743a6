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

//! Lifecycle bridge between a [`Configuration`] and an [`Engine`]
//!
//! # State machine
//!
//! ```text
//! new() ──► Initialized ──update()──► Running ──stop()──► Stopped
//!                ▲                        ▲                  │
//!                │                        └────update()──────┘
//!                └── destroy() from any state ──► Destroyed (terminal)
//! ```
//!
//! `Initialized` and `Stopped` allow the same operations. While `update()`
//! reconfigures the engine it is stopped, so no remapping happens for that
//! short window.

use thiserror::Error;

use crate::config::Configuration;
use crate::core::{Key, KeyCombination};
use crate::engine::Engine;

/// Errors reported by the lifecycle bridge
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Engine handle could not be acquired
    #[error("Failed to initialise the remapping engine: {0}")]
    Init(String),

    /// Engine refused to start with the applied configuration
    #[error("Failed to start the remapping engine: {0}")]
    Start(String),

    /// Operation on a bridge whose handle was already released
    #[error("Remapping engine has already been destroyed")]
    Destroyed,
}

/// Observable lifecycle state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BridgeState {
    /// Handle acquired, never started
    Initialized,
    /// Engine is remapping
    Running,
    /// Handle valid, engine inactive
    Stopped,
    /// Handle released
    Destroyed,
}

/// Immutable set of values pushed into the engine by one `update()`
///
/// Mappings are ordered by their rendered source combination so the same
/// configuration always produces the same call sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub switch_key: Key,
    pub default_combination: Option<KeyCombination>,
    pub mappings: Vec<(KeyCombination, KeyCombination)>,
}

impl From<&Configuration> for EngineSnapshot {
    fn from(configuration: &Configuration) -> Self {
        Self {
            switch_key: configuration.switch_key,
            default_combination: configuration.default_combination.clone(),
            mappings: configuration
                .sorted_mappings()
                .into_iter()
                .map(|(source, replacement)| (source.clone(), replacement.clone()))
                .collect(),
        }
    }
}

/// Owns one engine handle and keeps it in sync with a configuration
///
/// The handle is acquired in [`new`](Self::new) and released exactly once,
/// either by [`destroy`](Self::destroy) or when the bridge is dropped.
///
/// None of the methods may run concurrently on the same bridge; the owner
/// serialises calls (the live-reload loop runs on the owning thread).
pub struct LifecycleBridge<E: Engine> {
    engine: E,
    handle: Option<E::Handle>,
    configuration: Configuration,
    started_once: bool,
}

impl<E: Engine> LifecycleBridge<E> {
    /// Acquires the engine handle
    ///
    /// The engine is not started; call [`update`](Self::update) to push the
    /// configuration and start remapping.
    ///
    /// # Errors
    ///
    /// `BridgeError::Init` if the engine can't provide a handle. There is no
    /// way to recover from this, callers should abort.
    pub fn new(mut engine: E, configuration: Configuration) -> Result<Self, BridgeError> {
        let handle = engine.initialize().map_err(BridgeError::Init)?;
        tracing::debug!("engine handle acquired");

        Ok(Self {
            engine,
            handle: Some(handle),
            configuration,
            started_once: false,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Replaces the held configuration; takes effect on the next `update()`
    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    pub fn state(&self) -> BridgeState {
        match &self.handle {
            None => BridgeState::Destroyed,
            Some(handle) if self.engine.is_running(handle) => BridgeState::Running,
            Some(_) if self.started_once => BridgeState::Stopped,
            Some(_) => BridgeState::Initialized,
        }
    }

    /// Fully reconfigures the engine and (re)starts it
    ///
    /// Stops a running engine first, then applies an [`EngineSnapshot`] of
    /// the current configuration: switch key, default combination (or the
    /// explicit "none"), cleared mapping table, every mapping. Mappings from
    /// a previous update never survive.
    ///
    /// # Errors
    ///
    /// * `BridgeError::Destroyed` - handle was already released
    /// * `BridgeError::Start` - engine refused to start; it stays stopped
    pub fn update(&mut self) -> Result<(), BridgeError> {
        if self.handle.is_none() {
            return Err(BridgeError::Destroyed);
        }

        self.stop();

        let snapshot = EngineSnapshot::from(&self.configuration);
        let Some(handle) = self.handle.as_mut() else {
            return Err(BridgeError::Destroyed);
        };

        self.engine.set_switch_key(handle, snapshot.switch_key);
        self.engine
            .set_default_combination(handle, snapshot.default_combination.as_ref());
        self.engine.clear_mappings(handle);
        for (source, replacement) in &snapshot.mappings {
            self.engine.add_mapping(handle, source, replacement);
        }

        self.started_once = true;
        if let Some(message) = self.engine.start(handle) {
            let text = self.engine.message_text(&message);
            self.engine.release_error_message(message);
            return Err(BridgeError::Start(text));
        }

        tracing::info!(
            switch_key = %snapshot.switch_key,
            mappings = snapshot.mappings.len(),
            "virtual layer running"
        );
        Ok(())
    }

    /// Stops the engine if it is running
    ///
    /// An error reported by the engine is logged and its message released;
    /// it never propagates.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        if !self.engine.is_running(handle) {
            return;
        }

        if let Some(message) = self.engine.stop(handle) {
            let text = self.engine.message_text(&message);
            self.engine.release_error_message(message);
            tracing::warn!(error = %text, "engine reported an error while stopping");
        } else {
            tracing::debug!("engine stopped");
        }
    }

    /// Stops the engine and releases the handle
    ///
    /// Safe to call more than once; only the first call releases anything.
    pub fn destroy(&mut self) {
        if self.handle.is_none() {
            return;
        }

        self.stop();

        if let Some(handle) = self.handle.take() {
            self.engine.destroy(handle);
            tracing::debug!("engine handle released");
        }
    }
}

impl<E: Engine> Drop for LifecycleBridge<E> {
    fn drop(&mut self) {
        self.destroy();
    }
}
