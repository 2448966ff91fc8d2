// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core types for the Refit chat assistant.
//!
//! This module defines the fundamental data structures used throughout the
//! application: prompt messages, file references, the fragment stream that
//! carries model output, and the provider abstraction.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A role-tagged text segment submitted to a model.
///
/// The prompt composer only ever emits `User` segments, but the type is
/// shared with the provider layer which speaks all three roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

// ============================================================================
// References & Requests
// ============================================================================

/// One unit of file context attached to a request.
///
/// Ordering is the insertion order from the request and is preserved all the
/// way into the composed message sequence. No uniqueness is enforced;
/// duplicate file names are legal and independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Base file name, without directory components.
    pub file_name: String,
    /// Language tag used for the fenced code block (e.g. "typescript").
    pub language_id: String,
    /// Full text of the file.
    pub content: String,
}

impl Reference {
    pub fn new(
        file_name: impl Into<String>,
        language_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            language_id: language_id.into(),
            content: content.into(),
        }
    }
}

/// A single composition request. Transient, one per invocation.
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    /// Command name resolved against templates; empty means no command.
    pub command: String,
    /// Free text from the user, already stripped of any `/command` token.
    pub user_query: String,
    /// File context, in attachment order.
    pub references: Vec<Reference>,
}

impl PromptRequest {
    pub fn new(command: impl Into<String>, user_query: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            user_query: user_query.into(),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = references;
        self
    }
}

/// Per-turn result metadata returned by the chat handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutcome {
    /// The command this turn resolved to; empty for free-form chat.
    pub command: String,
}

impl ChatOutcome {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Outcome for a turn that resolved no command.
    pub fn none() -> Self {
        Self {
            command: String::new(),
        }
    }
}

// ============================================================================
// Model Selection
// ============================================================================

/// Selection criterion for picking a model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelector {
    /// Backend vendor identifier (e.g. "openai", "ollama").
    pub vendor: String,
    /// Model family within the vendor (e.g. "gpt-4o").
    pub family: String,
}

impl ModelSelector {
    pub fn new(vendor: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            family: family.into(),
        }
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new("openai", "gpt-4o")
    }
}

impl std::fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vendor, self.family)
    }
}

/// Sizing hints for a model request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Maximum tokens the model may generate.
    pub max_tokens: Option<u32>,
}

impl RequestOptions {
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

// ============================================================================
// Fragment Stream
// ============================================================================

/// Default channel capacity between a provider task and the consumer.
const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

/// A finite, ordered, single-pass sequence of response text pieces.
///
/// The stream terminates normally when the producer side is dropped, or
/// abnormally by yielding an `Err` as its final item. It is non-restartable:
/// once a fragment has been pulled it is gone. Dropping the stream is the
/// cooperative cancellation signal; the producer observes the closed channel
/// and stops.
pub struct FragmentStream {
    rx: mpsc::Receiver<Result<String, ProviderError>>,
}

impl FragmentStream {
    /// Create a connected sender/stream pair.
    pub fn channel() -> (FragmentSender, FragmentStream) {
        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        (FragmentSender { tx }, FragmentStream { rx })
    }

    /// Build a stream whose items are already known.
    ///
    /// Used by scripted providers and tests; the items are buffered up
    /// front, so no producer task is needed.
    pub fn preloaded(items: Vec<Result<String, ProviderError>>) -> FragmentStream {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(item);
        }
        FragmentStream { rx }
    }

    /// Pull the next fragment.
    ///
    /// Returns `None` at normal end of stream. An `Err` item is always the
    /// last one the stream yields.
    pub async fn next(&mut self) -> Option<Result<String, ProviderError>> {
        self.rx.recv().await
    }

    /// Drain the remaining fragments into a single string.
    ///
    /// Stops at the first error and returns it; already-collected text is
    /// discarded, so this is only suitable for non-incremental callers.
    pub async fn collect_text(mut self) -> Result<String, ProviderError> {
        let mut out = String::new();
        while let Some(item) = self.next().await {
            out.push_str(&item?);
        }
        Ok(out)
    }
}

/// Producer handle for a [`FragmentStream`].
pub struct FragmentSender {
    tx: mpsc::Sender<Result<String, ProviderError>>,
}

impl FragmentSender {
    /// Send one fragment of response text.
    ///
    /// Returns `false` when the consumer has dropped the stream, which the
    /// producer should treat as cancellation.
    pub async fn fragment(&self, text: impl Into<String>) -> bool {
        self.tx.send(Ok(text.into())).await.is_ok()
    }

    /// Terminate the stream with an error.
    ///
    /// Consumes the sender so nothing can follow the error item.
    pub async fn fail(self, err: ProviderError) -> bool {
        self.tx.send(Err(err)).await.is_ok()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

use async_trait::async_trait;

/// Trait implemented by model backends.
///
/// A provider accepts an ordered message sequence plus sizing hints and
/// returns a [`FragmentStream`] of response text. Everything else about the
/// backend (transport, authentication, wire format) is its own business.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Submit a message sequence and stream back the response text.
    async fn stream_chat(
        &self,
        messages: &[PromptMessage],
        options: &RequestOptions,
    ) -> Result<FragmentStream, ProviderError>;

    /// Provider name for display and logging.
    fn name(&self) -> &str;

    /// The model this provider is bound to.
    fn model(&self) -> &str;

    /// Maximum prompt size the bound model accepts, in tokens.
    fn max_input_tokens(&self) -> u32 {
        128_000
    }
}

/// A boxed provider for dynamic dispatch.
pub type BoxedProvider = Box<dyn Provider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_message_roles() {
        let msg = PromptMessage::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_model_selector_display() {
        let sel = ModelSelector::new("openai", "gpt-4o");
        assert_eq!(sel.to_string(), "openai/gpt-4o");
        assert_eq!(ModelSelector::default(), sel);
    }

    #[test]
    fn test_reference_order_independent_duplicates() {
        let req = PromptRequest::new("refactor_function", "clean up").with_references(vec![
            Reference::new("a.ts", "typescript", "1"),
            Reference::new("a.ts", "typescript", "2"),
        ]);
        assert_eq!(req.references.len(), 2);
        assert_eq!(req.references[0].content, "1");
        assert_eq!(req.references[1].content, "2");
    }

    #[tokio::test]
    async fn test_fragment_stream_normal_end() {
        let (tx, mut stream) = FragmentStream::channel();
        tokio::spawn(async move {
            tx.fragment("foo").await;
            tx.fragment("bar").await;
        });

        assert_eq!(stream.next().await.unwrap().unwrap(), "foo");
        assert_eq!(stream.next().await.unwrap().unwrap(), "bar");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_fragment_stream_error_terminates() {
        let stream = FragmentStream::preloaded(vec![
            Ok("partial".to_string()),
            Err(ProviderError::StreamError("connection reset".to_string())),
        ]);

        let err = stream.collect_text().await.unwrap_err();
        assert!(matches!(err, ProviderError::StreamError(_)));
    }

    #[tokio::test]
    async fn test_fragment_sender_observes_cancellation() {
        let (tx, stream) = FragmentStream::channel();
        drop(stream);
        assert!(!tx.fragment("ignored").await);
    }

    #[tokio::test]
    async fn test_collect_text() {
        let stream = FragmentStream::preloaded(vec![
            Ok("foo".to_string()),
            Ok("bar".to_string()),
        ]);
        assert_eq!(stream.collect_text().await.unwrap(), "foobar");
    }
}
