// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Reference acquisition.
//!
//! Builds [`Reference`] entries from files on disk: the language tag is
//! derived from the extension, the file name is stripped of its directory,
//! and the content is read in full.

use std::path::Path;

use crate::types::Reference;

/// Extension to language tag mapping. Fallback is `plaintext`.
const LANGUAGE_IDS: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("ts", "typescript"),
    ("tsx", "typescriptreact"),
    ("js", "javascript"),
    ("jsx", "javascriptreact"),
    ("py", "python"),
    ("go", "go"),
    ("java", "java"),
    ("rb", "ruby"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("sh", "shellscript"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("md", "markdown"),
    ("html", "html"),
    ("css", "css"),
    ("sql", "sql"),
];

/// Derive the language tag for a file path.
pub fn language_id_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    LANGUAGE_IDS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, id)| *id)
        .unwrap_or("plaintext")
}

/// Load a file as a reference.
///
/// The reference's file name is the base name only, matching how an editor
/// displays an attachment.
pub fn load_reference(path: &Path) -> std::io::Result<Reference> {
    let content = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(Reference {
        language_id: language_id_for_path(path).to_string(),
        file_name,
        content,
    })
}

/// Load several paths as references, preserving argument order.
pub fn load_references(paths: &[impl AsRef<Path>]) -> std::io::Result<Vec<Reference>> {
    paths
        .iter()
        .map(|path| load_reference(path.as_ref()))
        .collect()
}
