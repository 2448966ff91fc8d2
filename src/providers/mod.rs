// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Model provider implementations.
//!
//! Providers are selected by a [`ModelSelector`] (vendor + family) and
//! return a [`crate::types::FragmentStream`] of response text. One concrete
//! backend ships here:
//!
//! - [`openai::OpenAiCompatProvider`] - OpenAI, Ollama, and any
//!   OpenAI-compatible chat-completions API, streamed over SSE.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use refit::providers::create_provider_from_env;
//! use refit::types::ModelSelector;
//!
//! let provider = create_provider_from_env(&ModelSelector::default())?;
//! let stream = provider.stream_chat(&messages, &options).await?;
//! ```

pub mod openai;

pub use openai::OpenAiCompatProvider;

use crate::error::ProviderError;
use crate::types::{BoxedProvider, ModelSelector};

/// Supported backend vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// OpenAI GPT models
    OpenAi,
    /// Ollama local models
    Ollama,
    /// Any OpenAI-compatible API
    OpenAiCompatible,
}

impl Vendor {
    /// Get the default base URL for this vendor.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::OpenAiCompatible => "https://api.openai.com/v1",
        }
    }

    /// Check if this vendor requires an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

/// Error type for parsing a vendor from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseVendorError;

impl std::fmt::Display for ParseVendorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid vendor")
    }
}

impl std::error::Error for ParseVendorError {}

impl std::str::FromStr for Vendor {
    type Err = ParseVendorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "openai-compatible" | "openai_compatible" => Ok(Self::OpenAiCompatible),
            _ => Err(ParseVendorError),
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "OpenAI"),
            Self::Ollama => write!(f, "Ollama"),
            Self::OpenAiCompatible => write!(f, "OpenAI-Compatible"),
        }
    }
}

/// Construction-time configuration for a provider instance.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Base URL for the API endpoint.
    pub base_url: Option<String>,
    /// Model identifier; defaults to the selector's family.
    pub model: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl ProviderConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Create a provider instance for a selector.
///
/// The selector's family is the model identifier unless the config
/// overrides it.
///
/// # Errors
///
/// Returns an error if required configuration is missing (API key for
/// OpenAI, base URL for OpenAI-Compatible).
pub fn create_provider(
    selector: &ModelSelector,
    config: ProviderConfig,
) -> Result<BoxedProvider, ProviderError> {
    let vendor: Vendor = selector
        .vendor
        .parse()
        .map_err(|_| ProviderError::NotConfigured(format!("Unknown vendor: {}", selector.vendor)))?;

    let model = config
        .model
        .clone()
        .unwrap_or_else(|| selector.family.clone());

    match vendor {
        Vendor::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured("API key required for OpenAI".to_string())
            })?;
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| vendor.default_base_url().to_string());

            Ok(Box::new(OpenAiCompatProvider::new(
                Some(api_key),
                model,
                base_url,
                "OpenAI",
                config,
            )))
        }
        Vendor::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| vendor.default_base_url().to_string());

            // Ollama doesn't need an API key
            Ok(Box::new(OpenAiCompatProvider::new(
                None, model, base_url, "Ollama", config,
            )))
        }
        Vendor::OpenAiCompatible => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                ProviderError::NotConfigured("base_url required for OpenAI-Compatible".to_string())
            })?;

            Ok(Box::new(OpenAiCompatProvider::new(
                config.api_key.clone(),
                model,
                base_url,
                "OpenAI-Compatible",
                config,
            )))
        }
    }
}

/// Create a provider for a selector, reading configuration from the
/// environment.
///
/// # Environment Variables
///
/// | Variable | Description |
/// |----------|-------------|
/// | `REFIT_MODEL` | Override the model (defaults to the selector family) |
/// | `OPENAI_API_KEY` | OpenAI API key |
/// | `OPENAI_BASE_URL` | Custom OpenAI(-compatible) base URL |
/// | `OLLAMA_BASE_URL` | Custom Ollama URL (default: localhost:11434) |
pub fn create_provider_from_env(selector: &ModelSelector) -> Result<BoxedProvider, ProviderError> {
    let vendor: Vendor = selector
        .vendor
        .parse()
        .map_err(|_| ProviderError::NotConfigured(format!("Unknown vendor: {}", selector.vendor)))?;

    let mut config = ProviderConfig::default();
    config.model = std::env::var("REFIT_MODEL").ok();

    match vendor {
        Vendor::OpenAi => {
            config.api_key = Some(std::env::var("OPENAI_API_KEY").map_err(|_| {
                ProviderError::NotConfigured(
                    "OPENAI_API_KEY not set. Set it or select the ollama vendor for local models."
                        .to_string(),
                )
            })?);
            config.base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        Vendor::Ollama => {
            config.base_url = std::env::var("OLLAMA_BASE_URL").ok();
        }
        Vendor::OpenAiCompatible => {
            config.api_key = std::env::var("OPENAI_API_KEY").ok();
            config.base_url = Some(std::env::var("OPENAI_BASE_URL").map_err(|_| {
                ProviderError::NotConfigured(
                    "OPENAI_BASE_URL required for the openai-compatible vendor".to_string(),
                )
            })?);
        }
    }

    create_provider(selector, config)
}
