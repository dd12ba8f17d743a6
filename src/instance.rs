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

//! src/instance.rs
//!
//! Single-instance guard
//!
//! Two engines hooking the same keyboard fight over every key press, so the
//! binary claims a process-wide name before it loads anything. The claim is
//! an OS object that disappears with the process:
//!
//! - Linux: a socket bound in the abstract namespace
//! - elsewhere: an exclusive lock on a file in the temp directory
//!
//! # Example
//!
//! ```no_run
//! use another_keyboard_layer::instance::{claim, ClaimOutcome};
//!
//! if claim("another-keyboard-layer", true)? == ClaimOutcome::AlreadyClaimed {
//!     eprintln!("Already running");
//!     std::process::exit(1);
//! }
//! # Ok::<(), another_keyboard_layer::instance::InstanceError>(())
//! ```

use std::{
    collections::HashMap,
    env, io,
    sync::{Mutex, OnceLock, PoisonError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Instance identifier must not be empty")]
    EmptyIdentifier,

    #[error("Failed to claim instance name '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClaimOutcome {
    /// This process now owns the name
    Acquired,
    /// Another process owns the name; nothing was retained
    AlreadyClaimed,
}

/// Process-wide name for `identifier`
///
/// `#<identifier>#instance`, prefixed with the user name when the claim is
/// per user.
pub fn signal_name(identifier: &str, current_user_only: bool) -> String {
    let name = format!("#{}#instance", identifier);
    if current_user_only {
        format!("{}{}", current_user(), name)
    } else {
        name
    }
}

fn current_user() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|user| !user.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Names claimed through one registry, with the OS objects keeping them
///
/// The binary uses the process-wide registry behind [`claim`]. Separate
/// registries behave like separate processes.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    claims: HashMap<String, NamedClaim>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `identifier` for this registry
    ///
    /// Claiming a name this registry already holds returns `Acquired` again.
    ///
    /// # Errors
    ///
    /// `InstanceError::EmptyIdentifier` for a blank identifier,
    /// `InstanceError::Io` if the OS object can't be created for a reason
    /// other than it already existing.
    pub fn claim(
        &mut self,
        identifier: &str,
        current_user_only: bool,
    ) -> Result<ClaimOutcome, InstanceError> {
        if identifier.trim().is_empty() {
            return Err(InstanceError::EmptyIdentifier);
        }

        let name = signal_name(identifier, current_user_only);
        if self.claims.contains_key(&name) {
            return Ok(ClaimOutcome::Acquired);
        }

        match NamedClaim::create(&name) {
            Ok(Some(claim)) => {
                tracing::debug!(name = %name, "instance claimed");
                self.claims.insert(name, claim);
                Ok(ClaimOutcome::Acquired)
            }
            Ok(None) => {
                tracing::debug!(name = %name, "instance already claimed elsewhere");
                Ok(ClaimOutcome::AlreadyClaimed)
            }
            Err(source) => Err(InstanceError::Io { name, source }),
        }
    }

    /// Gives up a claim; returns whether it was held
    pub fn release(&mut self, identifier: &str, current_user_only: bool) -> bool {
        self.claims
            .remove(&signal_name(identifier, current_user_only))
            .is_some()
    }

    pub fn is_claimed(&self, identifier: &str, current_user_only: bool) -> bool {
        self.claims
            .contains_key(&signal_name(identifier, current_user_only))
    }
}

static REGISTRY: OnceLock<Mutex<InstanceRegistry>> = OnceLock::new();

/// Claims `identifier` for the rest of the process lifetime
///
/// See [`InstanceRegistry::claim`].
pub fn claim(identifier: &str, current_user_only: bool) -> Result<ClaimOutcome, InstanceError> {
    REGISTRY
        .get_or_init(|| Mutex::new(InstanceRegistry::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .claim(identifier, current_user_only)
}

#[cfg(target_os = "linux")]
#[derive(Debug)]
struct NamedClaim {
    _listener: std::os::unix::net::UnixListener,
}

#[cfg(target_os = "linux")]
impl NamedClaim {
    /// `Ok(None)` if the name is taken
    fn create(name: &str) -> io::Result<Option<Self>> {
        use std::os::linux::net::SocketAddrExt;
        use std::os::unix::net::{SocketAddr, UnixListener};

        let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
        match UnixListener::bind_addr(&addr) {
            Ok(listener) => Ok(Some(Self {
                _listener: listener,
            })),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
struct NamedClaim {
    _file: std::fs::File,
}

#[cfg(not(target_os = "linux"))]
impl NamedClaim {
    /// `Ok(None)` if the name is taken
    ///
    /// The file stays on disk; only the exclusive lock on it marks the
    /// claim, and the OS drops that lock when the process exits.
    fn create(name: &str) -> io::Result<Option<Self>> {
        use std::fs::{OpenOptions, TryLockError};

        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = env::temp_dir().join(format!("{}.lock", file_name));

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(e)) => Err(e),
        }
    }
}
