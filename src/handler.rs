// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chat turn orchestration.
//!
//! The handler drives one request end to end: resolve the command, gather
//! references, compose the message sequence, call the provider, and stream
//! the response into the chat sink. One logical flow per request - one
//! composition, one model call, one stream consumption.
//!
//! # Error handling
//!
//! Provider errors are logged and swallowed at this call site so the
//! conversation can continue; an off-topic policy rejection additionally
//! renders a fixed apology as output. Everything else (reference IO,
//! buffer edits) is logged and rethrown to surface in the host's own error
//! UI. No retries anywhere.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::PromptSettings;
use crate::error::{ProviderError, Result};
use crate::prompt::{compose, extract_command};
use crate::stream::{render_markdown, replace_with_stream, ChatSink, EditBuffer};
use crate::types::{
    BoxedProvider, ChatOutcome, PromptMessage, PromptRequest, Reference, RequestOptions,
};

/// Meta-command that carries its real command embedded in the prompt text.
const CUSTOM_COMMAND: &str = "custom";

/// Rendered when a `custom` turn contains no embedded command.
const USAGE_HINT: &str =
    "Please provide a command to execute. For example, `/refactor_function`.";

/// Rendered when the model rejects a request as off-topic.
const OFF_TOPIC_APOLOGY: &str = "I'm sorry, I can only explain computer science concepts.";

/// One incoming chat turn.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Slash command from the chat surface; empty means free-form chat.
    pub command: String,
    /// Free text of the turn.
    pub prompt: String,
    /// Explicitly attached files, in attachment order.
    pub attachments: Vec<PathBuf>,
    /// The active document, used as the sole reference when nothing is
    /// attached. `None` when no editor is focused.
    pub active_document: Option<Reference>,
}

/// Drives chat turns against a single provider.
pub struct ChatHandler {
    provider: BoxedProvider,
    options: RequestOptions,
}

impl ChatHandler {
    pub fn new(provider: BoxedProvider) -> Self {
        Self {
            provider,
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Handle one chat turn, rendering the response into the sink.
    pub async fn handle(
        &self,
        request: &ChatRequest,
        settings: &PromptSettings,
        sink: &mut dyn ChatSink,
    ) -> Result<ChatOutcome> {
        if request.command.is_empty() {
            // Free-form chat: raw prompt, no template, no references.
            let messages = vec![PromptMessage::user(request.prompt.clone())];
            self.stream_to_sink(&messages, sink).await;
            info!(kind = "", "chat turn completed");
            return Ok(ChatOutcome::none());
        }

        let references = self.gather_references(request, sink)?;

        let (command, user_query) = if request.command == CUSTOM_COMMAND {
            sink.progress("Thinking ...");
            let (command, query) = extract_command(&request.prompt);
            if command.is_empty() {
                sink.markdown(USAGE_HINT);
                return Ok(ChatOutcome::none());
            }
            (command, query)
        } else {
            sink.progress("Refactoring the code ...");
            (request.command.clone(), request.prompt.clone())
        };

        let prompt_request =
            PromptRequest::new(command.clone(), user_query).with_references(references);
        let messages = compose(&prompt_request, &settings.string_overrides());

        self.stream_to_sink(&messages, sink).await;

        info!(kind = %command, "chat turn completed");
        Ok(ChatOutcome::command(command))
    }

    /// Rewrite a buffer from the model's response to its current contents.
    ///
    /// The buffer's text becomes the sole user message; the response then
    /// replaces the buffer via clear-then-append streaming. A mid-stream
    /// failure ends up rendered inside the buffer; an edit failure is
    /// fatal and rethrown.
    pub async fn rewrite_buffer(&self, buffer: &mut dyn EditBuffer) -> Result<()> {
        let messages = vec![PromptMessage::user(buffer.contents())];

        let stream = match self.provider.stream_chat(&messages, &self.options).await {
            Ok(stream) => stream,
            Err(err) => {
                error!(code = err.code(), "model request failed: {err}");
                return Ok(());
            }
        };

        replace_with_stream(buffer, stream).await?;
        Ok(())
    }

    /// Collect references for a command turn.
    ///
    /// Explicit attachments win; otherwise the active document (if any)
    /// becomes the single reference.
    fn gather_references(
        &self,
        request: &ChatRequest,
        sink: &mut dyn ChatSink,
    ) -> Result<Vec<Reference>> {
        if request.attachments.is_empty() {
            return Ok(request.active_document.clone().into_iter().collect());
        }

        let mut references = Vec::with_capacity(request.attachments.len());
        for path in &request.attachments {
            sink.reference(path);
            let reference = crate::context::load_reference(path).map_err(|err| {
                error!(path = %path.display(), "failed to read attachment: {err}");
                err
            })?;
            references.push(reference);
        }
        Ok(references)
    }

    /// Send the composed messages and render the response progressively.
    ///
    /// Provider failures are absorbed here per the error taxonomy; output
    /// already rendered stays in place.
    async fn stream_to_sink(&self, messages: &[PromptMessage], sink: &mut dyn ChatSink) {
        let stream = match self.provider.stream_chat(messages, &self.options).await {
            Ok(stream) => stream,
            Err(err) => {
                self.report_provider_error(&err, sink);
                return;
            }
        };

        if let Err(err) = render_markdown(stream, sink).await {
            self.report_provider_error(&err, sink);
        }
    }

    fn report_provider_error(&self, err: &ProviderError, sink: &mut dyn ChatSink) {
        error!(
            code = err.code(),
            cause = err.cause().unwrap_or(""),
            "model request failed: {err}"
        );

        if err.is_off_topic() {
            sink.markdown(OFF_TOPIC_APOLOGY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptSettings;
    use crate::stream::CollectingSink;
    use crate::types::{FragmentStream, Provider};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted provider: records the messages it was sent and replays a
    /// fixed list of stream items (or an up-front failure).
    struct ScriptedProvider {
        script: Vec<std::result::Result<String, fn() -> ProviderError>>,
        upfront_error: Option<fn() -> ProviderError>,
        seen: Mutex<Vec<Vec<PromptMessage>>>,
    }

    impl ScriptedProvider {
        fn fragments(fragments: &[&str]) -> Self {
            Self {
                script: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                upfront_error: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(upfront_error: fn() -> ProviderError) -> Self {
            Self {
                script: Vec::new(),
                upfront_error: Some(upfront_error),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn stream_chat(
            &self,
            messages: &[PromptMessage],
            _options: &RequestOptions,
        ) -> std::result::Result<FragmentStream, ProviderError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            if let Some(make_err) = self.upfront_error {
                return Err(make_err());
            }
            Ok(FragmentStream::preloaded(
                self.script
                    .iter()
                    .map(|item| match item {
                        Ok(text) => Ok(text.clone()),
                        Err(make_err) => Err(make_err()),
                    })
                    .collect(),
            ))
        }

        fn name(&self) -> &str {
            "Scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }
    }

    fn off_topic_error() -> ProviderError {
        ProviderError::ContentPolicy {
            message: "rejected".to_string(),
            cause: "off_topic".to_string(),
        }
    }

    fn quota_error() -> ProviderError {
        ProviderError::api("quota exceeded", 429)
    }

    #[tokio::test]
    async fn test_free_form_turn() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::fragments(&["Hi", "!"])));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            prompt: "hello there".to_string(),
            ..Default::default()
        };

        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome, ChatOutcome::none());
        assert_eq!(sink.output(), "Hi!");
    }

    #[tokio::test]
    async fn test_command_turn_composes_template_and_reference() {
        let provider = ScriptedProvider::fragments(&["done"]);
        let handler = ChatHandler::new(Box::new(provider));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            command: "refactor_function".to_string(),
            prompt: "clean this up".to_string(),
            active_document: Some(Reference::new("app.ts", "typescript", "const x = 1;")),
            ..Default::default()
        };

        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.command, "refactor_function");
        assert_eq!(sink.output(), "done");
        assert_eq!(sink.progress_messages(), ["Refactoring the code ..."]);
    }

    #[tokio::test]
    async fn test_custom_turn_extracts_embedded_command() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::fragments(&["ok"])));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            command: "custom".to_string(),
            prompt: "/refactor_solid tighten this".to_string(),
            ..Default::default()
        };

        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome.command, "refactor_solid");
        assert_eq!(sink.progress_messages(), ["Thinking ..."]);
    }

    #[tokio::test]
    async fn test_custom_turn_without_command_renders_hint() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::fragments(&["never sent"])));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            command: "custom".to_string(),
            prompt: "no slash command in here".to_string(),
            ..Default::default()
        };

        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome, ChatOutcome::none());
        assert_eq!(sink.output(), USAGE_HINT);
    }

    #[tokio::test]
    async fn test_off_topic_renders_apology() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::failing(off_topic_error)));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            prompt: "tell me a story".to_string(),
            ..Default::default()
        };

        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome, ChatOutcome::none());
        assert_eq!(sink.output(), OFF_TOPIC_APOLOGY);
    }

    #[tokio::test]
    async fn test_other_provider_errors_are_swallowed() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::failing(quota_error)));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            prompt: "hello".to_string(),
            ..Default::default()
        };

        // The turn succeeds with no output; the conversation can continue.
        let outcome = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(outcome, ChatOutcome::none());
        assert_eq!(sink.output(), "");
    }

    #[tokio::test]
    async fn test_missing_attachment_is_rethrown() {
        let handler = ChatHandler::new(Box::new(ScriptedProvider::fragments(&["x"])));
        let mut sink = CollectingSink::new();
        let request = ChatRequest {
            command: "refactor_function".to_string(),
            prompt: "go".to_string(),
            attachments: vec![PathBuf::from("/does/not/exist.rs")],
            ..Default::default()
        };

        let result = handler
            .handle(&request, &PromptSettings::default(), &mut sink)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rewrite_buffer_replaces_contents() {
        use crate::stream::TextBuffer;

        let handler = ChatHandler::new(Box::new(ScriptedProvider::fragments(&["foo", "bar"])));
        let mut buffer = TextBuffer::from_text("old content");

        handler.rewrite_buffer(&mut buffer).await.unwrap();
        assert_eq!(buffer.contents(), "foobar");
    }

    #[tokio::test]
    async fn test_rewrite_buffer_swallows_provider_error() {
        use crate::stream::TextBuffer;

        let handler = ChatHandler::new(Box::new(ScriptedProvider::failing(quota_error)));
        let mut buffer = TextBuffer::from_text("untouched");

        handler.rewrite_buffer(&mut buffer).await.unwrap();
        // Request never started streaming, so the buffer is left alone.
        assert_eq!(buffer.contents(), "untouched");
    }
}
