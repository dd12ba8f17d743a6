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

//! Reload module tests
//!
//! Most tests drive the reloader through a scripted source so timing and
//! lock behaviour are deterministic. Two tests go through a real file, one
//! of them through the file watcher and the run loop.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fs, io,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant, SystemTime},
};
use tempfile::TempDir;

use crate::{
    config::{ConfigError, Configuration},
    core::{Key, KeyCombination, VirtualKey},
    engine::{BridgeError, BridgeState, DryRunEngine, EngineRecorder, LifecycleBridge},
    reload::{
        is_transient_lock, ConfigSource, FileSource, FileWatcher, LiveReloader, ReloadError,
        ReloadOutcome,
    },
};

const INITIAL: &str = "start_with_system = false\n\
                       switch_key = \"Capital\"\n\
                       default_simulation_combination = \"\"\n\
                       [mappings]\n\
                       a = \"b\"\n";

const UPDATED: &str = "start_with_system = false\n\
                       switch_key = \"Capital\"\n\
                       default_simulation_combination = \"\"\n\
                       [mappings]\n\
                       c = \"d\"\n";

#[derive(Default)]
struct Script {
    modified: Option<SystemTime>,
    reads: VecDeque<io::Result<String>>,
    read_count: usize,
}

/// Source whose modification time and read results are set by the test
#[derive(Clone, Default)]
struct ScriptedSource(Rc<RefCell<Script>>);

impl ScriptedSource {
    fn touch(&self, seconds: u64) {
        self.0.borrow_mut().modified = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds));
    }

    fn push_read(&self, result: io::Result<String>) {
        self.0.borrow_mut().reads.push_back(result);
    }

    fn read_count(&self) -> usize {
        self.0.borrow().read_count
    }
}

impl ConfigSource for ScriptedSource {
    fn modified(&self) -> io::Result<SystemTime> {
        self.0
            .borrow()
            .modified
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn read(&self) -> io::Result<String> {
        let mut script = self.0.borrow_mut();
        script.read_count += 1;
        script
            .reads
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::from(io::ErrorKind::NotFound)))
    }
}

fn combination(raw: &str) -> KeyCombination {
    KeyCombination::parse(raw).unwrap()
}

/// Helper: Running bridge over INITIAL plus a reloader on a scripted source
fn create_reloader() -> (
    LiveReloader<DryRunEngine, ScriptedSource>,
    ScriptedSource,
    EngineRecorder,
) {
    let engine = DryRunEngine::new();
    let recorder = engine.recorder();
    let mut bridge =
        LifecycleBridge::new(engine, Configuration::from_document(INITIAL).unwrap()).unwrap();
    bridge.update().unwrap();

    let source = ScriptedSource::default();
    let reloader = LiveReloader::new(bridge, source.clone()).with_retry_interval(Duration::ZERO);
    (reloader, source, recorder)
}

#[test]
fn test_valid_change_is_applied() {
    let (mut reloader, source, recorder) = create_reloader();
    source.touch(1);
    source.push_read(Ok(UPDATED.to_string()));

    let outcome = reloader.handle_change().unwrap();

    assert_eq!(outcome, ReloadOutcome::Applied);
    assert_eq!(
        recorder.snapshot().mappings,
        vec![(combination("c"), combination("d"))]
    );
    assert_eq!(reloader.bridge().state(), BridgeState::Running);
    assert_eq!(
        reloader.bridge().configuration(),
        &Configuration::from_document(UPDATED).unwrap()
    );
}

#[test]
fn test_duplicate_notification_is_ignored() {
    let (mut reloader, source, recorder) = create_reloader();
    source.touch(1);
    source.push_read(Ok(UPDATED.to_string()));
    reloader.handle_change().unwrap();
    recorder.clear_calls();

    let outcome = reloader.handle_change().unwrap();

    assert_eq!(outcome, ReloadOutcome::Duplicate);
    assert_eq!(source.read_count(), 1);
    assert!(recorder.calls().is_empty(), "Duplicate must not touch the engine");
}

#[test]
fn test_new_modification_time_reloads_again() {
    let (mut reloader, source, recorder) = create_reloader();
    source.touch(1);
    source.push_read(Ok(UPDATED.to_string()));
    reloader.handle_change().unwrap();

    source.touch(2);
    source.push_read(Ok(INITIAL.to_string()));
    assert_eq!(reloader.handle_change().unwrap(), ReloadOutcome::Applied);

    assert_eq!(
        recorder.snapshot().mappings,
        vec![(combination("a"), combination("b"))]
    );
}

#[test]
fn test_locked_file_is_retried() {
    let (mut reloader, source, _recorder) = create_reloader();
    source.touch(1);
    source.push_read(Err(io::Error::from(io::ErrorKind::WouldBlock)));
    source.push_read(Err(io::Error::from(io::ErrorKind::ResourceBusy)));
    source.push_read(Err(io::Error::from(io::ErrorKind::WouldBlock)));
    source.push_read(Ok(UPDATED.to_string()));

    assert_eq!(reloader.handle_change().unwrap(), ReloadOutcome::Applied);
    assert_eq!(source.read_count(), 4);
}

#[test]
fn test_other_io_errors_are_reported() {
    let (mut reloader, source, recorder) = create_reloader();
    source.touch(1);
    source.push_read(Err(io::Error::from(io::ErrorKind::PermissionDenied)));
    recorder.clear_calls();

    let err = reloader.handle_change().unwrap_err();

    assert!(matches!(err, ReloadError::Io(_)));
    assert_eq!(source.read_count(), 1);
    assert!(recorder.calls().is_empty());
    assert_eq!(reloader.bridge().state(), BridgeState::Running);
}

#[test]
fn test_invalid_document_keeps_last_good_config() {
    let (mut reloader, source, recorder) = create_reloader();
    source.touch(1);
    source.push_read(Ok("switch_key = \"Capital\"\n".to_string()));
    recorder.clear_calls();

    let err = reloader.handle_change().unwrap_err();

    assert!(matches!(
        err,
        ReloadError::Config(ConfigError::MissingField(_))
    ));
    assert!(recorder.calls().is_empty(), "Engine must not be reconfigured");
    assert!(recorder.snapshot().running);
    assert_eq!(
        reloader.bridge().configuration(),
        &Configuration::from_document(INITIAL).unwrap()
    );
}

#[test]
fn test_start_failure_is_reported() {
    let (mut reloader, source, recorder) = create_reloader();
    recorder.fail_start(Some("hook refused".to_string()));
    source.touch(1);
    source.push_read(Ok(UPDATED.to_string()));

    let err = reloader.handle_change().unwrap_err();

    assert!(matches!(err, ReloadError::Bridge(BridgeError::Start(_))));
    assert_eq!(recorder.snapshot().messages_released, 1);
}

#[test]
fn test_missing_modification_time_is_reported() {
    let (mut reloader, _source, _recorder) = create_reloader();

    assert!(matches!(
        reloader.handle_change(),
        Err(ReloadError::Io(_))
    ));
}

#[test]
fn test_into_bridge_returns_same_bridge() {
    let (reloader, _source, recorder) = create_reloader();

    let mut bridge = reloader.into_bridge();
    assert_eq!(bridge.state(), BridgeState::Running);

    bridge.destroy();
    assert_eq!(recorder.snapshot().handles_destroyed, 1);
}

#[test]
fn test_reload_from_real_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("layer.toml");
    fs::write(&path, INITIAL).unwrap();

    let engine = DryRunEngine::new();
    let recorder = engine.recorder();
    let mut config = Configuration::new(Key::Virtual(VirtualKey::Shift));
    config.mappings.insert(combination("x"), combination("y"));
    let mut bridge = LifecycleBridge::new(engine, config).unwrap();
    bridge.update().unwrap();

    let mut reloader = LiveReloader::new(bridge, FileSource::new(&path));
    assert_eq!(reloader.handle_change().unwrap(), ReloadOutcome::Applied);

    let state = recorder.snapshot();
    assert_eq!(state.switch_key, Some(Key::Virtual(VirtualKey::Capital)));
    assert_eq!(state.mappings, vec![(combination("a"), combination("b"))]);
}

#[test]
fn test_run_applies_watched_change_and_stops_on_shutdown() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("layer.toml");
    fs::write(&path, INITIAL).unwrap();

    let engine = DryRunEngine::new();
    let recorder = engine.recorder();
    let mut bridge =
        LifecycleBridge::new(engine, Configuration::from_document(INITIAL).unwrap()).unwrap();
    bridge.update().unwrap();

    let watcher = FileWatcher::new(&path).unwrap();
    let mut reloader = LiveReloader::new(bridge, FileSource::new(&path));
    let shutdown = Arc::new(AtomicBool::new(false));

    // Replace the file by rename so every event sees the complete document
    let writer = {
        let staged = temp_dir.path().join("layer.toml.new");
        let path = path.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            fs::write(&staged, UPDATED).unwrap();
            fs::rename(&staged, &path).unwrap();
        })
    };

    // Fails the test instead of hanging it if no change ever arrives
    let deadline = Instant::now() + Duration::from_secs(10);
    let timeout = {
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(50));
            }
            shutdown.store(true, Ordering::Relaxed);
        })
    };

    let mut outcomes = Vec::new();
    reloader
        .run(&watcher, &shutdown, |outcome| {
            outcomes.push(outcome.as_ref().copied().map_err(ToString::to_string));
            if matches!(outcome, Ok(ReloadOutcome::Applied)) {
                shutdown.store(true, Ordering::Relaxed);
            }
        })
        .unwrap();

    writer.join().unwrap();
    timeout.join().unwrap();

    assert_eq!(outcomes.last(), Some(&Ok(ReloadOutcome::Applied)));
    assert!(Instant::now() < deadline, "Run loop only ended on timeout");
    assert_eq!(
        recorder.snapshot().mappings,
        vec![(combination("c"), combination("d"))]
    );
    assert_eq!(reloader.bridge().state(), BridgeState::Running);
}

#[test]
fn test_run_returns_immediately_when_already_shut_down() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("layer.toml");
    fs::write(&path, INITIAL).unwrap();

    let (mut reloader, _source, recorder) = create_reloader();
    let watcher = FileWatcher::new(&path).unwrap();
    let shutdown = AtomicBool::new(true);
    recorder.clear_calls();

    let mut calls = 0;
    reloader.run(&watcher, &shutdown, |_| calls += 1).unwrap();

    assert_eq!(calls, 0);
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_transient_lock_classification() {
    assert!(is_transient_lock(&io::Error::from(io::ErrorKind::WouldBlock)));
    assert!(is_transient_lock(&io::Error::from(io::ErrorKind::ResourceBusy)));
    assert!(!is_transient_lock(&io::Error::from(io::ErrorKind::NotFound)));
    assert!(!is_transient_lock(&io::Error::from(
        io::ErrorKind::PermissionDenied
    )));
}
