// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI-compatible provider implementation.
//!
//! Speaks the `chat/completions` API with SSE streaming, which also covers
//! Ollama and other compatible backends. Response text is forwarded
//! incrementally into a [`FragmentStream`] by a producer task; the consumer
//! dropping the stream cancels the producer.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::ProviderConfig;
use crate::error::ProviderError;
use crate::types::{
    FragmentSender, FragmentStream, PromptMessage, Provider, RequestOptions, Role,
};

/// Default max tokens if the caller passes no sizing hint.
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// OpenAI-compatible chat-completions provider.
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    provider_name: &'static str,
}

impl OpenAiCompatProvider {
    /// Create a new provider instance.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        provider_name: &'static str,
        config: ProviderConfig,
    ) -> Self {
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
            provider_name,
        }
    }

    fn build_request(&self, messages: &[PromptMessage], options: &RequestOptions) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: true,
            max_tokens: Some(options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
        }
    }

    /// Map a non-success HTTP response into a provider error.
    ///
    /// Content-policy rejections are recognized by their cause text so the
    /// caller's `is_off_topic` check works; everything else becomes an API
    /// error carrying the backend's message as cause.
    fn handle_error_response(&self, status: u16, body: &str) -> ProviderError {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let detail = parsed.error;
                let cause = match &detail.code {
                    Some(code) => format!("{}: {}", code, detail.message),
                    None => detail.message.clone(),
                };

                if cause.contains("off_topic") {
                    ProviderError::ContentPolicy {
                        message: detail.message,
                        cause,
                    }
                } else {
                    ProviderError::api_with_cause(detail.message, status, cause)
                }
            }
            Err(_) => ProviderError::api(format!("HTTP {status}: {body}"), status),
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    async fn stream_chat(
        &self,
        messages: &[PromptMessage],
        options: &RequestOptions,
    ) -> Result<FragmentStream, ProviderError> {
        let request = self.build_request(messages, options);

        debug!(
            model = %self.model,
            messages = messages.len(),
            "sending streaming chat request"
        );

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.header("authorization", format!("Bearer {api_key}"));
        }

        let response = req
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.handle_error_response(status.as_u16(), &error_text));
        }

        let (tx, stream) = FragmentStream::channel();
        tokio::spawn(pump_sse(response, tx));

        Ok(stream)
    }

    fn name(&self) -> &str {
        self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Forward SSE data lines from the HTTP response into the fragment channel.
///
/// Chunk boundaries from the transport do not align with SSE line
/// boundaries, so incoming bytes are buffered and split on newlines; only
/// complete lines are parsed.
async fn pump_sse(response: reqwest::Response, tx: FragmentSender) {
    let mut byte_stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = byte_stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                tx.fail(ProviderError::StreamError(e.to_string())).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim_end_matches('\r').to_string();
            buffer.drain(..=pos);

            match apply_sse_line(&line, &tx).await {
                LineOutcome::Continue => {}
                LineOutcome::Finished => return,
            }
        }
    }
    // Producer drops tx here; the consumer sees a normal end of stream.
}

enum LineOutcome {
    Continue,
    Finished,
}

/// Handle one complete SSE line.
async fn apply_sse_line(line: &str, tx: &FragmentSender) -> LineOutcome {
    if line.is_empty() || line.starts_with(':') {
        return LineOutcome::Continue;
    }

    let Some(data) = line.strip_prefix("data: ") else {
        return LineOutcome::Continue;
    };

    if data.trim() == "[DONE]" {
        return LineOutcome::Finished;
    }

    let Ok(chunk) = serde_json::from_str::<ChatStreamChunk>(data) else {
        // Tolerate unknown payloads; compatible backends add extra events.
        return LineOutcome::Continue;
    };

    for choice in &chunk.choices {
        if let Some(ref content) = choice.delta.content {
            if !content.is_empty() && !tx.fragment(content.clone()).await {
                // Consumer dropped the stream: cooperative cancellation.
                return LineOutcome::Finished;
            }
        }
    }

    LineOutcome::Continue
}

// ============================================================================
// API Types
// ============================================================================

/// Request body for the chat-completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// API message format.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl From<&PromptMessage> for ChatMessage {
    fn from(msg: &PromptMessage) -> Self {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        Self {
            role,
            content: msg.content.clone(),
        }
    }
}

/// Streaming chunk.
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

/// Choice in a streaming chunk.
#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// API error response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}
