// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the Refit chat assistant.
//!
//! This module provides strongly-typed errors for different parts of the
//! application, using `thiserror` for ergonomic error definitions and
//! `anyhow` for error propagation.
//!
//! The error taxonomy is deliberately flat: every failure is handled exactly
//! once at its call site, either logged-and-suppressed, rendered as visible
//! output, or rethrown. There is no retry path anywhere in the crate.

use thiserror::Error;

/// Marker substring a content-policy rejection carries in its cause message.
const OFF_TOPIC_MARKER: &str = "off_topic";

/// Errors that can occur during model provider operations.
///
/// Each variant exposes a stable `code` string; some carry an optional
/// `cause` message forwarded from the backend, which is what off-topic
/// detection inspects.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
        cause: Option<String>,
    },

    #[error("Streaming error: {0}")]
    StreamError(String),

    #[error("Response parsing error: {0}")]
    ParseError(String),

    #[error("Request rejected by content policy: {message}")]
    ContentPolicy { message: String, cause: String },
}

impl ProviderError {
    /// Create an API error with status code.
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: Some(status_code),
            cause: None,
        }
    }

    /// Create an API error without status code.
    pub fn api_message(message: impl Into<String>) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    /// Create an API error carrying a backend cause message.
    pub fn api_with_cause(
        message: impl Into<String>,
        status_code: u16,
        cause: impl Into<String>,
    ) -> Self {
        Self::ApiError {
            message: message.into(),
            status_code: Some(status_code),
            cause: Some(cause.into()),
        }
    }

    /// Stable error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::NetworkError(_) => "network",
            Self::ApiError { .. } => "api",
            Self::StreamError(_) => "stream",
            Self::ParseError(_) => "parse",
            Self::ContentPolicy { .. } => "content_policy",
        }
    }

    /// Backend cause message, if the provider forwarded one.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::ApiError { cause, .. } => cause.as_deref(),
            Self::ContentPolicy { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Check whether this is an off-topic/policy rejection.
    ///
    /// Backends signal this only through the cause message text, so the
    /// check is a substring match on `off_topic`.
    pub fn is_off_topic(&self) -> bool {
        self.cause().is_some_and(|c| c.contains(OFF_TOPIC_MARKER))
    }
}

/// Errors that can occur while applying edits to a text buffer.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Buffer is read-only: {0}")]
    ReadOnly(String),

    #[error("Edit rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for EditError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors that can occur during manifest command-list synchronization.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Manifest parsing error: {0}")]
    ParseError(String),

    #[error("Manifest has no command list at {0}")]
    MissingCommandList(String),
}

impl From<std::io::Error> for ManifestError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
