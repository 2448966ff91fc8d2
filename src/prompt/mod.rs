// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Prompt composition.
//!
//! Turns a [`PromptRequest`] plus a configuration snapshot into the ordered
//! message sequence submitted to the model:
//!
//! 1. the resolved template, if the command has one (override wins over
//!    built-in; absence is not an error),
//! 2. the user query, if non-empty after trimming,
//! 3. one segment per reference, in attachment order.
//!
//! Composition is pure given the snapshot and never fails; degenerate input
//! simply yields a shorter (possibly empty) sequence.

pub mod builtins;

pub use builtins::{builtin_template, BUILTIN_TEMPLATES};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PromptOverrides;
use crate::types::{PromptMessage, PromptRequest, Reference};

/// First maximal run of word characters immediately following a `/`.
static COMMAND_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\w+)").expect("command token pattern is valid"));

/// Compose the message sequence for a request.
///
/// The segment order is fixed: template, query, references. Reference
/// content is passed through verbatim; embedded fence sequences are not
/// escaped. This is a documented limitation, matching the upstream
/// behavior, not something to silently repair.
pub fn compose(request: &PromptRequest, overrides: &PromptOverrides) -> Vec<PromptMessage> {
    let mut messages = Vec::new();

    let template = overrides
        .get(&request.command)
        .or_else(|| builtin_template(&request.command));
    if let Some(template) = template {
        messages.push(PromptMessage::user(template));
    }

    let query = request.user_query.trim();
    if !query.is_empty() {
        messages.push(PromptMessage::user(query));
    }

    for reference in &request.references {
        messages.push(PromptMessage::user(reference_segment(reference)));
    }

    messages
}

/// Render one reference as a context segment.
///
/// Header is the uppercased file name; the fence is tagged with the
/// reference's language id.
fn reference_segment(reference: &Reference) -> String {
    format!(
        "# {} CONTEXT\n```{}\n{}```",
        reference.file_name.to_uppercase(),
        reference.language_id,
        reference.content,
    )
}

/// Extract an embedded `/command` token from free text.
///
/// Returns the command name and the remaining query (the matched
/// `/command` removed once, trimmed). An empty command name means "no
/// command found"; the query is then the original text unchanged.
pub fn extract_command(prompt: &str) -> (String, String) {
    match COMMAND_TOKEN.captures(prompt) {
        Some(caps) => {
            let command = caps[1].to_string();
            let query = prompt
                .replacen(&format!("/{command}"), "", 1)
                .trim()
                .to_string();
            (command, query)
        }
        None => (String::new(), prompt.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptOverrides;

    fn overrides(entries: &[(&str, &str)]) -> PromptOverrides {
        PromptOverrides::from_entries(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_compose_full_sequence() {
        let request = PromptRequest::new("refactor_function", "clean this up").with_references(
            vec![Reference::new("app.ts", "typescript", "const x = 1;\n")],
        );
        let messages = compose(&request, &PromptOverrides::default());

        assert_eq!(messages.len(), 3);
        assert!(messages[0].content.contains("DRY"));
        assert_eq!(messages[1].content, "clean this up");
        assert_eq!(
            messages[2].content,
            "# APP.TS CONTEXT\n```typescript\nconst x = 1;\n```"
        );
    }

    #[test]
    fn test_compose_no_template_is_not_an_error() {
        let request = PromptRequest::new("not_a_known_command", "hello");
        let messages = compose(&request, &PromptOverrides::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[test]
    fn test_compose_override_beats_builtin() {
        let request = PromptRequest::new("refactor_function", "");
        let messages = compose(
            &request,
            &overrides(&[("refactor_function", "my custom instructions")]),
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "my custom instructions");
    }

    #[test]
    fn test_compose_blank_query_omitted() {
        let request = PromptRequest::new("refactor_solid", "   \n\t ");
        let messages = compose(&request, &PromptOverrides::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("SOLID"));
    }

    #[test]
    fn test_compose_degenerate_is_empty() {
        let request = PromptRequest::default();
        assert!(compose(&request, &PromptOverrides::default()).is_empty());
    }

    #[test]
    fn test_compose_reference_order_preserved() {
        let request = PromptRequest::new("", "").with_references(vec![
            Reference::new("first.rs", "rust", "a"),
            Reference::new("second.py", "python", "b"),
        ]);
        let messages = compose(&request, &PromptOverrides::default());
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.starts_with("# FIRST.RS CONTEXT"));
        assert!(messages[1].content.starts_with("# SECOND.PY CONTEXT"));
    }

    #[test]
    fn test_reference_fences_pass_through() {
        // Embedded fences are not escaped; documented limitation.
        let request = PromptRequest::new("", "").with_references(vec![Reference::new(
            "notes.md",
            "markdown",
            "```rust\nfn main() {}\n```\n",
        )]);
        let messages = compose(&request, &PromptOverrides::default());
        assert!(messages[0].content.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_extract_command_basic() {
        let (command, query) = extract_command("/refactor_function clean this up");
        assert_eq!(command, "refactor_function");
        assert_eq!(query, "clean this up");
    }

    #[test]
    fn test_extract_command_mid_text() {
        let (command, query) = extract_command("please /refactor_solid this file");
        assert_eq!(command, "refactor_solid");
        // Only outer whitespace is trimmed; the interior gap stays.
        assert_eq!(query, "please  this file");
    }

    #[test]
    fn test_extract_command_none() {
        let (command, query) = extract_command("no command here");
        assert_eq!(command, "");
        assert_eq!(query, "no command here");
    }

    #[test]
    fn test_extract_command_bare_slash() {
        let (command, query) = extract_command("just a / alone");
        assert_eq!(command, "");
        assert_eq!(query, "just a / alone");
    }
}
