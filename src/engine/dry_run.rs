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

//! Dry-run engine
//!
//! Accepts every engine call, records it and prints what a native engine
//! would have done. Nothing is hooked. Failures can be injected through the
//! [`EngineRecorder`] to exercise error paths.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{Key, KeyCombination};
use crate::engine::Engine;

/// One call made into the engine, in the order it happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Initialize,
    SetSwitchKey(Key),
    SetDefaultCombination(Option<KeyCombination>),
    ClearMappings,
    AddMapping(KeyCombination, KeyCombination),
    Start,
    Stop,
    ReleaseErrorMessage(String),
    Destroy,
}

/// Everything the dry-run engine has seen so far
#[derive(Clone, Debug, Default)]
pub struct RecordedState {
    pub calls: Vec<EngineCall>,
    pub switch_key: Option<Key>,
    pub default_combination: Option<KeyCombination>,
    /// Mapping table as currently applied
    pub mappings: Vec<(KeyCombination, KeyCombination)>,
    pub running: bool,
    pub handles_created: usize,
    pub handles_destroyed: usize,
    pub messages_issued: usize,
    pub messages_released: usize,

    fail_initialize: Option<String>,
    fail_start: Option<String>,
    fail_stop: Option<String>,
}

/// Shared view of a [`DryRunEngine`]'s state
///
/// Stays valid after the engine has been moved into a bridge.
#[derive(Clone, Debug, Default)]
pub struct EngineRecorder {
    state: Arc<Mutex<RecordedState>>,
}

impl EngineRecorder {
    fn lock(&self) -> MutexGuard<'_, RecordedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RecordedState {
        self.lock().clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes the next `initialize()` fail with `message`
    pub fn fail_initialize(&self, message: impl Into<String>) {
        self.lock().fail_initialize = Some(message.into());
    }

    /// Makes every `start()` fail with `message` until cleared
    pub fn fail_start(&self, message: Option<String>) {
        self.lock().fail_start = message;
    }

    /// Makes every `stop()` report `message` until cleared
    ///
    /// The engine still stops.
    pub fn fail_stop(&self, message: Option<String>) {
        self.lock().fail_stop = message;
    }
}

/// Handle issued by [`DryRunEngine`]
#[derive(Debug)]
pub struct DryRunHandle {
    id: usize,
}

/// Error message allocated by [`DryRunEngine`]
#[derive(Debug)]
pub struct DryRunMessage(String);

/// Engine that records calls instead of hooking the keyboard
#[derive(Debug, Default)]
pub struct DryRunEngine {
    recorder: EngineRecorder,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to inspect or script this engine from outside
    pub fn recorder(&self) -> EngineRecorder {
        self.recorder.clone()
    }

    fn issue_message(state: &mut RecordedState, text: String) -> DryRunMessage {
        state.messages_issued += 1;
        DryRunMessage(text)
    }
}

impl Engine for DryRunEngine {
    type Handle = DryRunHandle;
    type ErrorMessage = DryRunMessage;

    fn initialize(&mut self) -> Result<DryRunHandle, String> {
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::Initialize);

        if let Some(message) = state.fail_initialize.take() {
            return Err(message);
        }

        state.handles_created += 1;
        Ok(DryRunHandle {
            id: state.handles_created,
        })
    }

    fn set_switch_key(&mut self, _handle: &mut DryRunHandle, key: Key) {
        tracing::debug!("[DRY RUN] Would set switch key: {}", key);
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::SetSwitchKey(key));
        state.switch_key = Some(key);
    }

    fn set_default_combination(
        &mut self,
        _handle: &mut DryRunHandle,
        combination: Option<&KeyCombination>,
    ) {
        match combination {
            Some(combination) => {
                tracing::debug!("[DRY RUN] Would set default combination: {}", combination)
            }
            None => tracing::debug!("[DRY RUN] Would disable default combination"),
        }

        let mut state = self.recorder.lock();
        state
            .calls
            .push(EngineCall::SetDefaultCombination(combination.cloned()));
        state.default_combination = combination.cloned();
    }

    fn clear_mappings(&mut self, _handle: &mut DryRunHandle) {
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::ClearMappings);
        state.mappings.clear();
    }

    fn add_mapping(
        &mut self,
        _handle: &mut DryRunHandle,
        source: &KeyCombination,
        replacement: &KeyCombination,
    ) {
        tracing::debug!("[DRY RUN] Would map: {} -> {}", source, replacement);
        let mut state = self.recorder.lock();
        state
            .calls
            .push(EngineCall::AddMapping(source.clone(), replacement.clone()));
        state.mappings.push((source.clone(), replacement.clone()));
    }

    fn start(&mut self, _handle: &mut DryRunHandle) -> Option<DryRunMessage> {
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::Start);

        if let Some(text) = state.fail_start.clone() {
            return Some(Self::issue_message(&mut state, text));
        }

        state.running = true;
        None
    }

    fn stop(&mut self, _handle: &mut DryRunHandle) -> Option<DryRunMessage> {
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::Stop);
        state.running = false;

        let text = state.fail_stop.clone()?;
        Some(Self::issue_message(&mut state, text))
    }

    fn is_running(&self, _handle: &DryRunHandle) -> bool {
        self.recorder.lock().running
    }

    fn message_text(&self, message: &DryRunMessage) -> String {
        message.0.clone()
    }

    fn release_error_message(&mut self, message: DryRunMessage) {
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::ReleaseErrorMessage(message.0));
        state.messages_released += 1;
    }

    fn destroy(&mut self, handle: DryRunHandle) {
        tracing::debug!("[DRY RUN] Releasing handle #{}", handle.id);
        let mut state = self.recorder.lock();
        state.calls.push(EngineCall::Destroy);
        state.running = false;
        state.handles_destroyed += 1;
    }
}
