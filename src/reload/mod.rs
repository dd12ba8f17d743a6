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

//! Live reload of the configuration file
//!
//! [`LiveReloader`] owns the [`LifecycleBridge`] and turns change
//! notifications into engine updates. Notifications are handled strictly one
//! after another on the owning thread:
//!
//! 1. Same modification time as last handled → ignored (editors often emit
//!    several events per save)
//! 2. Read the file, waiting while another process has it locked
//! 3. Invalid document → reported, the running configuration stays
//! 4. Valid document → pushed into the bridge and applied with `update()`

pub mod file_watcher;
pub mod source;

pub use file_watcher::FileWatcher;
pub use source::{is_transient_lock, ConfigSource, FileSource};

use chrono::{DateTime, Local};
use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, SystemTime},
};
use thiserror::Error;

use crate::config::{ConfigError, Configuration};
use crate::engine::{BridgeError, Engine, LifecycleBridge};

/// Wait between attempts to read a locked file
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// How long [`LiveReloader::run`] blocks before re-checking for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Why a reload didn't take effect
#[derive(Debug, Error)]
pub enum ReloadError {
    /// File couldn't be read (other than a transient lock)
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    /// New document is invalid; the previous configuration stays active
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    /// Engine rejected the new configuration
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Cannot watch path without a file name: {0}")]
    InvalidPath(PathBuf),

    #[error("File watcher stopped delivering events")]
    WatcherClosed,
}

/// Result of handling one change notification
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReloadOutcome {
    /// Modification time unchanged since the last handled notification
    Duplicate,
    /// New configuration validated and applied
    Applied,
}

/// Applies configuration file changes to a running engine
pub struct LiveReloader<E: Engine, S: ConfigSource> {
    bridge: LifecycleBridge<E>,
    source: S,
    last_modified: Option<SystemTime>,
    retry_interval: Duration,
}

impl<E: Engine, S: ConfigSource> LiveReloader<E, S> {
    pub fn new(bridge: LifecycleBridge<E>, source: S) -> Self {
        Self {
            bridge,
            source,
            last_modified: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Overrides the wait between reads of a locked file
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn bridge(&self) -> &LifecycleBridge<E> {
        &self.bridge
    }

    /// Gives the bridge back, e.g. to destroy it explicitly
    pub fn into_bridge(self) -> LifecycleBridge<E> {
        self.bridge
    }

    /// Handles one change notification
    ///
    /// # Errors
    ///
    /// * `ReloadError::Io` - modification time or content unreadable
    /// * `ReloadError::Config` - new document invalid, nothing changed
    /// * `ReloadError::Bridge` - engine didn't accept the new configuration
    pub fn handle_change(&mut self) -> Result<ReloadOutcome, ReloadError> {
        let modified = self.source.modified()?;
        if self.last_modified == Some(modified) {
            tracing::debug!("ignoring duplicate change notification");
            return Ok(ReloadOutcome::Duplicate);
        }
        self.last_modified = Some(modified);

        tracing::info!(
            modified = %DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M:%S%.3f"),
            "trying to reload config file"
        );

        let content = self.read_waiting_for_lock()?;
        let configuration = Configuration::from_document(&content).inspect_err(|e| {
            tracing::warn!(error = %e, "keeping previous config");
        })?;

        self.apply(configuration)?;
        Ok(ReloadOutcome::Applied)
    }

    fn read_waiting_for_lock(&self) -> Result<String, ReloadError> {
        loop {
            match self.source.read() {
                Ok(content) => return Ok(content),
                Err(e) if is_transient_lock(&e) => {
                    tracing::warn!(error = %e, "config file locked, retrying");
                    thread::sleep(self.retry_interval);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn apply(&mut self, configuration: Configuration) -> Result<(), ReloadError> {
        self.bridge.set_configuration(configuration);
        self.bridge.update()?;
        tracing::info!("reload successful");
        Ok(())
    }

    /// Processes notifications from `watcher` until `shutdown` is set
    ///
    /// `on_outcome` sees the result of every handled notification. Failed
    /// reloads don't end the loop.
    ///
    /// # Errors
    ///
    /// `ReloadError::WatcherClosed` if the watcher backend goes away.
    pub fn run<F>(
        &mut self,
        watcher: &FileWatcher,
        shutdown: &AtomicBool,
        mut on_outcome: F,
    ) -> Result<(), ReloadError>
    where
        F: FnMut(&Result<ReloadOutcome, ReloadError>),
    {
        while !shutdown.load(Ordering::Relaxed) {
            if watcher.recv_timeout(POLL_INTERVAL)? {
                let outcome = self.handle_change();
                if let Err(e) = &outcome {
                    tracing::error!(error = %e, "reload failed");
                }
                on_outcome(&outcome);
            }
        }

        tracing::debug!("live reload stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
