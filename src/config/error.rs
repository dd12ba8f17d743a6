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

use std::path::PathBuf;
use thiserror::Error;

use crate::core::{CombinationError, KeyError};

/// Errors that can occur while parsing, loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Document is not valid TOML (or a field has the wrong type).
    #[error("Config is not a valid document: {0}")]
    Syntax(String),
    /// A required field is absent.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    /// The switch key field holds an invalid key.
    #[error("Invalid switch key: {0}")]
    InvalidSwitchKey(#[source] KeyError),
    /// A combination field (default combination or mapping) is malformed.
    #[error("Invalid key combination in {field}: {source}")]
    InvalidCombination {
        field: String,
        #[source]
        source: CombinationError,
    },
    /// The configuration could not be rendered back to a document.
    #[error("Failed to serialise config: {0}")]
    SerializeFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// Neither `$XDG_CONFIG_HOME` nor a home directory is available.
    #[error("Could not determine a config directory")]
    NoConfigDirectory,
    /// Configuration file has no parent directory to create.
    #[error("Config path has no parent directory: {0}")]
    NoParentDirectory(PathBuf),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// True for errors caused by the document's content rather than I/O.
    pub fn is_parsing_error(&self) -> bool {
        matches!(
            self,
            ConfigError::Syntax(_)
                | ConfigError::MissingField(_)
                | ConfigError::InvalidSwitchKey(_)
                | ConfigError::InvalidCombination { .. }
        )
    }
}
