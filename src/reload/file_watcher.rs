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

//! File system watcher for the configuration file
//!
//! Uses OS-level file watching (inotify on Linux) via the notify crate. The
//! parent directory is watched rather than the file itself so editors that
//! save by replacing the file are still seen.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    path::Path,
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    time::Duration,
};

use crate::reload::ReloadError;

/// Watches one configuration file and queues a notification per change
///
/// Notifications are produced on the notify backend's thread and consumed
/// one at a time by whoever owns the watcher.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
}

impl FileWatcher {
    /// Starts watching `path`
    ///
    /// # Errors
    ///
    /// `ReloadError::Watch` if the backend can't be created or the parent
    /// directory can't be watched, `ReloadError::InvalidPath` if `path` has
    /// no file name.
    pub fn new(path: &Path) -> Result<Self, ReloadError> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| ReloadError::InvalidPath(path.to_path_buf()))?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_change_of(&event, &file_name) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "file watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(&parent, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "watching config for changes");

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Waits up to `timeout` for the next change notification
    ///
    /// Returns `Ok(false)` on timeout.
    ///
    /// # Errors
    ///
    /// `ReloadError::WatcherClosed` once the backend has gone away.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<bool, ReloadError> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Ok(true),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(ReloadError::WatcherClosed),
        }
    }
}

/// Modify and create events on the watched file name count as changes
fn is_change_of(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|name| name == file_name.as_os_str()))
}
