// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Refit - slash-command chat assistant core.
//!
//! Refit resolves user slash-commands to prompt templates (built-in or
//! user-configured), composes an ordered message sequence with optional
//! file-context references, submits it to a streaming model provider, and
//! applies the returned fragment stream either as progressive markdown
//! output or as a replace-then-append rewrite of a text buffer.
//!
//! # Architecture
//!
//! - [`types`] - Core type definitions (PromptMessage, Reference,
//!   FragmentStream, Provider, etc.)
//! - [`error`] - Error types and result aliases
//! - [`config`] - Prompt settings snapshot loading and merging
//! - [`prompt`] - Prompt composition and command extraction
//! - [`stream`] - Stream appliers: progressive render and buffer replace
//! - [`providers`] - Model provider implementations
//! - [`handler`] - Chat turn orchestration
//! - [`context`] - Reference acquisition from files
//! - [`manifest`] - Command-list synchronization utility
//! - [`telemetry`] - Tracing infrastructure
//!
//! # Example
//!
//! ```rust,ignore
//! use refit::config::load_settings;
//! use refit::handler::{ChatHandler, ChatRequest};
//! use refit::providers::create_provider_from_env;
//! use refit::types::ModelSelector;
//!
//! let provider = create_provider_from_env(&ModelSelector::default())?;
//! let handler = ChatHandler::new(provider);
//!
//! let settings = load_settings(std::path::Path::new("."))?;
//! let request = ChatRequest {
//!     command: "refactor_function".to_string(),
//!     prompt: "remove the duplication".to_string(),
//!     ..Default::default()
//! };
//! let outcome = handler.handle(&request, &settings, &mut sink).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod manifest;
pub mod prompt;
pub mod providers;
pub mod stream;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, EditError, ManifestError, ProviderError, Result};
pub use handler::{ChatHandler, ChatRequest};
pub use prompt::{compose, extract_command};
pub use providers::{create_provider, create_provider_from_env, OpenAiCompatProvider};
pub use stream::{render_markdown, replace_with_stream, ChatSink, EditBuffer, TextBuffer};
pub use types::{
    BoxedProvider, ChatOutcome, FragmentSender, FragmentStream, ModelSelector, PromptMessage,
    PromptRequest, Provider, Reference, RequestOptions, Role,
};

/// Refit version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        // Verify key types are accessible
        let _msg = PromptMessage::user("test");
        let _req = PromptRequest::new("refactor_function", "query");
        let _sel = ModelSelector::default();
    }
}
