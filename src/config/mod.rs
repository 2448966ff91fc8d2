// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for Refit.
//!
//! Prompt templates live under the `prompts` namespace of a config file.
//! Two sources are merged per key (workspace wins over global), and the
//! result is an explicit [`PromptSettings`] snapshot the caller passes into
//! composition. Nothing here is cached process-wide: the caller reloads the
//! snapshot before each turn, so live edits to the config files are picked
//! up without hidden global state.
//!
//! - Global config: `~/.refit/config.json`
//! - Workspace config: `.refit.json`, `.refit/config.json`, or
//!   `refit.config.json` (first found wins)
//!
//! JSON and YAML are both accepted; key order is preserved because the
//! manifest sync utility appends new commands in configuration key order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Config file names to search for in a workspace (in order).
pub const CONFIG_FILES: &[&str] = &[".refit.json", ".refit/config.json", "refit.config.json"];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".refit";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Reserved keys never treated as template entries.
///
/// The upstream configuration object exposed accessor methods under the
/// same namespace as the prompt entries; these names are excluded
/// unconditionally so override semantics stay identical.
pub const RESERVED_KEYS: &[&str] = &["has", "get", "update", "inspect"];

/// On-disk configuration file shape. Unknown sections are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Prompt template namespace: command name to template body.
    ///
    /// Values are arbitrary JSON here; only string-valued entries become
    /// overrides.
    #[serde(default)]
    pub prompts: Map<String, Value>,
}

/// A merged, read-only snapshot of the prompt configuration.
#[derive(Debug, Clone, Default)]
pub struct PromptSettings {
    entries: Map<String, Value>,
}

impl PromptSettings {
    /// Build a snapshot from a raw key/value map.
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Raw entries, in configuration key order.
    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Filter the snapshot down to usable template overrides.
    ///
    /// Non-string values are excluded (guards against unrelated
    /// configuration in the same namespace), as are the reserved keys.
    /// Key order is preserved.
    pub fn string_overrides(&self) -> PromptOverrides {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                value
                    .as_str()
                    .map(|text| (key.clone(), text.to_string()))
            })
            .collect();
        PromptOverrides::from_entries(entries)
    }
}

/// String-valued template overrides, in configuration key order.
#[derive(Debug, Clone, Default)]
pub struct PromptOverrides {
    entries: Vec<(String, String)>,
}

impl PromptOverrides {
    pub fn from_entries(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Look up an override by command name.
    pub fn get(&self, command: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == command)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate entries in configuration key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load a configuration file (JSON or YAML).
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Load the global config, if present.
pub fn load_global_settings() -> Result<Option<SettingsFile>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_settings_file(&path).map(Some)
}

/// Load the workspace config, if present.
///
/// Searches [`CONFIG_FILES`] in order and loads the first match.
pub fn load_workspace_settings(workspace_root: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_settings_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load and merge the prompt settings snapshot for a workspace.
///
/// This is the main entry point; call it before each composition so live
/// config edits are observed. Workspace entries win per key; global-only
/// entries are kept, and new workspace keys are appended after them.
pub fn load_settings(workspace_root: &Path) -> Result<PromptSettings, ConfigError> {
    let global = load_global_settings()?;
    let workspace = load_workspace_settings(workspace_root)?;
    Ok(merge_settings(global, workspace))
}

/// Merge global and workspace sections with workspace precedence.
pub fn merge_settings(
    global: Option<SettingsFile>,
    workspace: Option<SettingsFile>,
) -> PromptSettings {
    let mut entries = global.map(|file| file.prompts).unwrap_or_default();

    if let Some(file) = workspace {
        for (key, value) in file.prompts {
            entries.insert(key, value);
        }
    }

    PromptSettings::from_map(entries)
}
