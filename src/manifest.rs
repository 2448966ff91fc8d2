// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Command-list synchronization.
//!
//! One-shot maintenance utility, run outside the request path: reconciles
//! the command list declared in a packaged manifest with the string-valued
//! entries of the prompt configuration.
//!
//! Rules:
//! - an existing entry whose name matches a configuration key gets its
//!   description overwritten in place,
//! - configuration keys with no matching entry are appended in
//!   configuration key order,
//! - manifest entries with no matching configuration key are left
//!   untouched (never deleted).
//!
//! The manifest is rewritten in full; unrelated content and key order are
//! preserved.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PromptSettings;
use crate::error::ManifestError;

/// JSON path to the command list inside the manifest.
const COMMANDS_PATH: &str = "contributes.chatParticipants[0].commands";

/// One declared command in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    pub description: String,
}

/// Reconcile a manifest file's command list with the settings snapshot.
///
/// Returns the resulting command list after the rewrite.
pub fn sync_commands(
    manifest_path: &Path,
    settings: &PromptSettings,
) -> Result<Vec<CommandEntry>, ManifestError> {
    let content = std::fs::read_to_string(manifest_path)?;
    let mut manifest: Value = serde_json::from_str(&content)?;

    let commands = command_list_mut(&mut manifest)?;
    let mut entries = parse_entries(commands)?;

    reconcile(&mut entries, settings);

    *commands = serde_json::to_value(&entries)?;
    std::fs::write(manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    Ok(entries)
}

/// Apply the reconciliation rules to an in-memory command list.
pub fn reconcile(entries: &mut Vec<CommandEntry>, settings: &PromptSettings) {
    for (name, description) in settings.string_overrides().iter() {
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.description = description.to_string(),
            None => entries.push(CommandEntry {
                name: name.to_string(),
                description: description.to_string(),
            }),
        }
    }
}

/// Locate the command list array inside the manifest.
fn command_list_mut(manifest: &mut Value) -> Result<&mut Value, ManifestError> {
    manifest
        .get_mut("contributes")
        .and_then(|v| v.get_mut("chatParticipants"))
        .and_then(|v| v.get_mut(0))
        .and_then(|v| v.get_mut("commands"))
        .filter(|v| v.is_array())
        .ok_or_else(|| ManifestError::MissingCommandList(COMMANDS_PATH.to_string()))
}

fn parse_entries(commands: &Value) -> Result<Vec<CommandEntry>, ManifestError> {
    serde_json::from_value(commands.clone()).map_err(ManifestError::from)
}
