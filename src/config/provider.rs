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

//! Configuration file loading, first-run bootstrap and saving

use atomic_write_file::AtomicWriteFile;
use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::config::{ConfigError, Configuration, CONFIG_FILE_NAME, DEFAULT_DOCUMENT};

/// Binds one [`Configuration`] to the file it was loaded from.
///
/// The path is fixed at construction. All writes go through
/// [`save_to_file`](Self::save_to_file), which replaces the file atomically.
#[derive(Debug)]
pub struct ConfigurationProvider {
    /// Path to the configuration file.
    config_path: PathBuf,
    configuration: Configuration,
}

impl ConfigurationProvider {
    /// Loads the configuration stored at `path`.
    ///
    /// If the file doesn't exist yet, the bundled default document is
    /// validated and written to `path` (parent directories included) before
    /// it is returned.
    ///
    /// # Errors
    ///
    /// Returns a parsing `ConfigError` if the file (or the bundled default)
    /// is invalid, and `ConfigError::Io`/`ConfigError::WriteFailed` if the
    /// file can't be read or the default can't be written.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use another_keyboard_layer::config::ConfigurationProvider;
    ///
    /// let provider = ConfigurationProvider::load_from_path(
    ///     "/home/user/.config/another-keyboard-layer.toml".into(),
    /// )?;
    /// println!("Switch key: {}", provider.configuration().switch_key);
    /// # Ok::<(), another_keyboard_layer::config::ConfigError>(())
    /// ```
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let configuration = Configuration::from_document(&content)?;
            tracing::info!(path = %path.display(), mappings = configuration.mappings.len(), "loaded config");

            return Ok(Self {
                config_path: path,
                configuration,
            });
        }

        let configuration = Configuration::from_document(DEFAULT_DOCUMENT)?;

        let parent = path
            .parent()
            .ok_or_else(|| ConfigError::NoParentDirectory(path.clone()))?;
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        write_atomically(&path, DEFAULT_DOCUMENT)?;
        tracing::info!(path = %path.display(), "created default config");

        Ok(Self {
            config_path: path,
            configuration,
        })
    }

    /// Loads the configuration from [`default_config_path`].
    pub fn load_from_default_location() -> Result<Self, ConfigError> {
        Self::load_from_path(default_config_path()?)
    }

    /// Path this provider reads from and saves to.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    /// Serialises the held configuration and overwrites the bound file.
    ///
    /// Comments in the existing file are not preserved.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let document = self.configuration.to_document()?;
        write_atomically(&self.config_path, &document)?;
        tracing::info!(path = %self.config_path.display(), "saved config");
        Ok(())
    }
}

/// Resolves the platform default configuration path.
///
/// `$XDG_CONFIG_HOME/another-keyboard-layer.toml` when the variable is set
/// and not blank, `~/.config/another-keyboard-layer.toml` otherwise.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(env::var_os("XDG_CONFIG_HOME").map(PathBuf::from), dirs::home_dir())
}

/// Path resolution with the environment passed in, so it can be tested
/// without touching process-wide variables.
pub(crate) fn resolve_config_path(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    let xdg = xdg_config_home.filter(|dir| !dir.to_string_lossy().trim().is_empty());

    let config_dir = match (xdg, home) {
        (Some(dir), _) => dir,
        (None, Some(home)) => home.join(".config"),
        (None, None) => return Err(ConfigError::NoConfigDirectory),
    };

    Ok(config_dir.join(CONFIG_FILE_NAME))
}

fn write_atomically(path: &Path, content: &str) -> Result<(), ConfigError> {
    // Open file for atomic writing
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    // Commit atomically
    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}
