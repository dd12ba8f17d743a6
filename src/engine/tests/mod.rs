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

//! Engine module tests
//!
//! Lifecycle bridge behaviour, checked against the dry-run engine's call log.

use crate::{
    config::{Configuration, DEFAULT_DOCUMENT},
    core::{Key, KeyCombination, VirtualKey},
    engine::{
        BridgeError, BridgeState, DryRunEngine, EngineCall, EngineRecorder, EngineSnapshot,
        LifecycleBridge,
    },
};

fn combination(raw: &str) -> KeyCombination {
    KeyCombination::parse(raw).unwrap()
}

/// Helper: Configuration with a single mapping
fn single_mapping(source: &str, target: &str) -> Configuration {
    let mut config = Configuration::new(Key::Virtual(VirtualKey::Capital));
    config.default_combination = Some(combination("Escape"));
    config.mappings.insert(combination(source), combination(target));
    config
}

/// Helper: Bridge over a fresh dry-run engine plus its recorder
fn create_bridge(config: Configuration) -> (LifecycleBridge<DryRunEngine>, EngineRecorder) {
    let engine = DryRunEngine::new();
    let recorder = engine.recorder();
    let bridge = LifecycleBridge::new(engine, config).unwrap();
    (bridge, recorder)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_acquires_handle_without_starting() {
    let (bridge, recorder) = create_bridge(single_mapping("a", "b"));

    assert_eq!(bridge.state(), BridgeState::Initialized);
    assert_eq!(recorder.calls(), vec![EngineCall::Initialize]);
    assert_eq!(recorder.snapshot().handles_created, 1);
}

#[test]
fn test_init_failure_is_fatal() {
    let engine = DryRunEngine::new();
    engine.recorder().fail_initialize("no hook available");

    let result = LifecycleBridge::new(engine, single_mapping("a", "b"));

    match result {
        Err(BridgeError::Init(message)) => assert_eq!(message, "no hook available"),
        Err(other) => panic!("Expected Init error, got: {:?}", other),
        Ok(_) => panic!("Expected Init error, got a bridge"),
    }
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_applies_configuration_in_order() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "o"));
    recorder.clear_calls();

    bridge.update().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![
            EngineCall::SetSwitchKey(Key::Virtual(VirtualKey::Capital)),
            EngineCall::SetDefaultCombination(Some(combination("Escape"))),
            EngineCall::ClearMappings,
            EngineCall::AddMapping(combination("a"), combination("o")),
            EngineCall::Start,
        ]
    );
    assert_eq!(bridge.state(), BridgeState::Running);
}

#[test]
fn test_update_passes_none_for_missing_default() {
    let mut config = single_mapping("a", "o");
    config.default_combination = None;
    let (mut bridge, recorder) = create_bridge(config);

    bridge.update().unwrap();

    assert!(recorder
        .calls()
        .contains(&EngineCall::SetDefaultCombination(None)));
    assert_eq!(recorder.snapshot().default_combination, None);
}

#[test]
fn test_update_twice_replaces_mappings() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    bridge.update().unwrap();

    bridge.set_configuration(single_mapping("c", "d"));
    recorder.clear_calls();
    bridge.update().unwrap();

    // Running engine is stopped before it is reconfigured
    assert_eq!(recorder.calls().first(), Some(&EngineCall::Stop));

    let state = recorder.snapshot();
    assert_eq!(state.mappings, vec![(combination("c"), combination("d"))]);
    assert!(state.running);
}

#[test]
fn test_update_with_empty_mappings_still_starts() {
    let mut config = Configuration::new(Key::Virtual(VirtualKey::Shift));
    config.default_combination = None;
    let (mut bridge, recorder) = create_bridge(config);

    bridge.update().unwrap();

    let calls = recorder.calls();
    assert!(calls.contains(&EngineCall::ClearMappings));
    assert!(!calls
        .iter()
        .any(|call| matches!(call, EngineCall::AddMapping(..))));
    assert_eq!(bridge.state(), BridgeState::Running);
}

#[test]
fn test_start_failure_reports_and_releases_message() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    recorder.fail_start(Some("hook refused".to_string()));

    let err = bridge.update().unwrap_err();

    assert_eq!(err, BridgeError::Start("hook refused".to_string()));
    let state = recorder.snapshot();
    assert_eq!(state.messages_issued, 1);
    assert_eq!(state.messages_released, 1);
    assert_eq!(bridge.state(), BridgeState::Stopped);

    // Recovers once the engine accepts a start again
    recorder.fail_start(None);
    bridge.update().unwrap();
    assert_eq!(bridge.state(), BridgeState::Running);
}

// ============================================================================
// Stop / destroy
// ============================================================================

#[test]
fn test_stop_transitions_to_stopped() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    bridge.update().unwrap();

    bridge.stop();

    assert_eq!(bridge.state(), BridgeState::Stopped);
    assert!(!recorder.snapshot().running);
}

#[test]
fn test_stop_when_not_running_does_nothing() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    recorder.clear_calls();

    bridge.stop();

    assert!(recorder.calls().is_empty());
    assert_eq!(bridge.state(), BridgeState::Initialized);
}

#[test]
fn test_stop_error_is_logged_not_fatal() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    bridge.update().unwrap();
    recorder.fail_stop(Some("unhook failed".to_string()));

    bridge.stop();

    let state = recorder.snapshot();
    assert_eq!(state.messages_issued, 1);
    assert_eq!(state.messages_released, 1);
    assert!(state
        .calls
        .contains(&EngineCall::ReleaseErrorMessage("unhook failed".to_string())));

    // Update still works after a failed stop
    recorder.fail_stop(None);
    bridge.update().unwrap();
    assert_eq!(bridge.state(), BridgeState::Running);
}

#[test]
fn test_destroy_is_idempotent() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    bridge.update().unwrap();

    bridge.destroy();
    bridge.destroy();
    drop(bridge);

    let state = recorder.snapshot();
    assert_eq!(state.handles_destroyed, 1);
    assert!(!state.running);
    let stops = state
        .calls
        .iter()
        .filter(|call| **call == EngineCall::Stop)
        .count();
    assert_eq!(stops, 1, "Destroy should stop a running engine exactly once");
}

#[test]
fn test_drop_releases_handle() {
    let (bridge, recorder) = create_bridge(single_mapping("a", "b"));

    drop(bridge);

    assert_eq!(recorder.snapshot().handles_destroyed, 1);
    assert_eq!(recorder.calls().last(), Some(&EngineCall::Destroy));
}

#[test]
fn test_operations_after_destroy() {
    let (mut bridge, recorder) = create_bridge(single_mapping("a", "b"));
    bridge.destroy();
    recorder.clear_calls();

    assert_eq!(bridge.state(), BridgeState::Destroyed);
    assert_eq!(bridge.update(), Err(BridgeError::Destroyed));
    bridge.stop();

    assert!(recorder.calls().is_empty());
}

// ============================================================================
// Snapshot
// ============================================================================

#[test]
fn test_snapshot_is_sorted_by_source() {
    let config = Configuration::from_document(DEFAULT_DOCUMENT).unwrap();
    let snapshot = EngineSnapshot::from(&config);

    assert_eq!(snapshot.switch_key, config.switch_key);
    assert_eq!(snapshot.mappings.len(), config.mappings.len());

    let sources: Vec<String> = snapshot
        .mappings
        .iter()
        .map(|(source, _)| source.to_string())
        .collect();
    let mut sorted = sources.clone();
    sorted.sort();
    assert_eq!(sources, sorted);
}
