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

//! Validated configuration and its TOML document form
//!
//! The document has exactly four required fields:
//!
//! ```toml
//! start_with_system = false
//! switch_key = "Capital"
//! default_simulation_combination = "Escape"   # "" means no default
//!
//! [mappings]
//! "j" = "Left"
//! "Shift+j" = "Shift+Left"
//! ```
//!
//! Parsing happens in two passes: serde turns the text into a table of raw
//! strings, then every key and combination is parsed with the core model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::ConfigError;
use crate::core::{Key, KeyCombination};

/// Document field names, shared by error messages and serialisation
pub const FIELD_AUTOSTART: &str = "start_with_system";
pub const FIELD_SWITCH_KEY: &str = "switch_key";
pub const FIELD_DEFAULT_COMBINATION: &str = "default_simulation_combination";
pub const FIELD_MAPPINGS: &str = "mappings";

/// Intermediate field table, straight out of the TOML parser
#[derive(Debug, Default, Deserialize, Serialize)]
struct RawDocument {
    #[serde(alias = "autostart")]
    start_with_system: Option<bool>,
    switch_key: Option<String>,
    default_simulation_combination: Option<String>,
    mappings: Option<BTreeMap<String, String>>,
}

/// Fully validated virtual layer configuration
///
/// Equality compares mappings as a set of pairs, so two configurations
/// parsed from documents with differently ordered (or differently spelled
/// but equal) combinations are equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    /// Whether the layer should be registered to start with the system
    pub autostart: bool,
    /// Key that toggles the virtual layer
    pub switch_key: Key,
    /// Combination simulated when the switch key is pressed on its own
    pub default_combination: Option<KeyCombination>,
    /// Source combination → replacement combination
    pub mappings: HashMap<KeyCombination, KeyCombination>,
}

impl Configuration {
    /// Creates a configuration with no default combination and no mappings
    pub fn new(switch_key: Key) -> Self {
        Self {
            autostart: false,
            switch_key,
            default_combination: None,
            mappings: HashMap::new(),
        }
    }

    /// Parses and validates a TOML document
    ///
    /// Two mapping entries whose sources are the same combination written in
    /// a different order (`"a+b"` and `"b+a"`) do not fail: the entry that
    /// sorts last by its document key wins.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Syntax` - not valid TOML, or a field has the wrong type
    /// * `ConfigError::MissingField` - one of the four fields is absent
    /// * `ConfigError::InvalidSwitchKey` - switch key doesn't parse
    /// * `ConfigError::InvalidCombination` - default or mapping doesn't parse
    ///
    /// # Example
    ///
    /// ```
    /// use another_keyboard_layer::config::Configuration;
    ///
    /// let config = Configuration::from_document(
    ///     "start_with_system = false\n\
    ///      switch_key = \"Shift\"\n\
    ///      default_simulation_combination = \"\"\n\
    ///      [mappings]\n\
    ///      a = \"o\"\n",
    /// )?;
    /// assert_eq!(config.mappings.len(), 1);
    /// assert!(config.default_combination.is_none());
    /// # Ok::<(), another_keyboard_layer::config::ConfigError>(())
    /// ```
    pub fn from_document(raw: &str) -> Result<Self, ConfigError> {
        let document: RawDocument =
            toml::from_str(raw).map_err(|e| ConfigError::Syntax(e.to_string()))?;

        let autostart = document
            .start_with_system
            .ok_or(ConfigError::MissingField(FIELD_AUTOSTART))?;
        let switch_key = document
            .switch_key
            .ok_or(ConfigError::MissingField(FIELD_SWITCH_KEY))?;
        let default_combination = document
            .default_simulation_combination
            .ok_or(ConfigError::MissingField(FIELD_DEFAULT_COMBINATION))?;
        let raw_mappings = document
            .mappings
            .ok_or(ConfigError::MissingField(FIELD_MAPPINGS))?;

        let switch_key = Key::parse(&switch_key).map_err(ConfigError::InvalidSwitchKey)?;

        let default_combination = if default_combination.is_empty() {
            None
        } else {
            Some(parse_field(FIELD_DEFAULT_COMBINATION, &default_combination)?)
        };

        let mut mappings = HashMap::with_capacity(raw_mappings.len());
        for (source, replacement) in &raw_mappings {
            let field = format!("{}.\"{}\"", FIELD_MAPPINGS, source);
            let source = parse_field(&field, source)?;
            let replacement = parse_field(&field, replacement)?;
            mappings.insert(source, replacement);
        }

        Ok(Self {
            autostart,
            switch_key,
            default_combination,
            mappings,
        })
    }

    /// Renders the configuration as a TOML document
    ///
    /// Comments and formatting of the document this configuration was
    /// parsed from are not preserved.
    pub fn to_document(&self) -> Result<String, ConfigError> {
        let mappings = self
            .mappings
            .iter()
            .map(|(source, replacement)| (source.to_string(), replacement.to_string()))
            .collect::<BTreeMap<_, _>>();

        let document = RawDocument {
            start_with_system: Some(self.autostart),
            switch_key: Some(self.switch_key.to_string()),
            default_simulation_combination: Some(
                self.default_combination
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            ),
            mappings: Some(mappings),
        };

        toml::to_string(&document).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
    }

    /// Mappings ordered by their rendered source combination
    pub fn sorted_mappings(&self) -> Vec<(&KeyCombination, &KeyCombination)> {
        let mut entries: Vec<_> = self.mappings.iter().collect();
        entries.sort_by_cached_key(|(source, _)| source.to_string());
        entries
    }
}

fn parse_field(field: &str, raw: &str) -> Result<KeyCombination, ConfigError> {
    KeyCombination::parse(raw).map_err(|source| ConfigError::InvalidCombination {
        field: field.to_string(),
        source,
    })
}
