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

//! Configuration document parsing and file management.
//!
//! - **`model`**: the validated [`Configuration`] and its TOML round trip
//! - **`provider`**: [`ConfigurationProvider`], which binds a configuration to
//!   a file, bootstraps the bundled default on first run and saves atomically
//!
//! # Example
//!
//! ```no_run
//! use another_keyboard_layer::config::ConfigurationProvider;
//!
//! let mut provider = ConfigurationProvider::load_from_default_location()?;
//! provider.configuration_mut().autostart = true;
//! provider.save_to_file()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod model;
pub mod provider;

pub use error::ConfigError;
pub use model::Configuration;
pub use provider::{default_config_path, ConfigurationProvider};

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "another-keyboard-layer.toml";

/// Document written on first run when no configuration file exists.
pub const DEFAULT_DOCUMENT: &str = include_str!("default-config.toml");

#[cfg(test)]
mod tests;
