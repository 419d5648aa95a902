// ABOUTME: Unified LLM provider selector for runtime provider switching
// ABOUTME: Abstracts over Groq and local OpenAI-compatible backends based on configuration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # LLM Provider Selector
//!
//! This module provides a unified interface for LLM providers that can be
//! configured at runtime.
//!
//! ## Configuration
//!
//! Set the `LLM_PROVIDER` environment variable:
//! - `groq` (default): Groq for cost-effective open-source models
//! - `local`: any `OpenAI`-compatible local server (Ollama, vLLM, `LocalAI`)
//!
//! When `LLM_FALLBACK_ENABLED=true` and the primary provider fails to
//! initialize, the provider named by `LLM_PROVIDER_FALLBACK` is tried next.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    ChatRequest, ChatResponse, GroqProvider, LlmProvider, OpenAiCompatibleConfig,
    OpenAiCompatibleProvider,
};
use crate::config::{LlmConfig, LlmProviderType};
use crate::errors::AppError;

/// Unified chat provider that wraps the configured backend
///
/// This enum provides a consistent interface regardless of which
/// underlying provider is configured.
#[derive(Debug)]
pub enum ChatProvider {
    /// Groq cloud inference
    Groq(GroqProvider),
    /// Local LLM via `OpenAI`-compatible API (Ollama, vLLM, `LocalAI`)
    Local(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Create a provider from server configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the primary provider cannot be initialized (for
    /// Groq, a missing API key) and fallback is disabled or also fails.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        info!(
            "Initializing LLM provider: {} (set {} to change)",
            config.provider,
            LlmProviderType::ENV_VAR
        );

        match Self::create_provider(config.provider, config) {
            Ok(provider) => {
                debug!(
                    "Provider {} initialized with model: {}",
                    provider.display_name(),
                    provider.default_model()
                );
                Ok(provider)
            }
            Err(primary_error) => Self::try_fallback(config, primary_error),
        }
    }

    /// Create a provider from environment configuration alone
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::from_config`].
    pub fn from_env() -> Result<Self, AppError> {
        let provider_type = LlmProviderType::from_env();
        let config = LlmConfig {
            provider: provider_type,
            fallback_provider: LlmProviderType::fallback_from_env(),
            fallback_enabled: LlmProviderType::is_fallback_enabled(),
            timeout_secs: crate::constants::limits::DEFAULT_LLM_TIMEOUT_SECS,
            local_base_url: String::new(),
            local_model: String::new(),
        };
        Self::from_config(&config)
    }

    /// Attempt to initialize a fallback provider after the primary fails
    fn try_fallback(config: &LlmConfig, primary_error: AppError) -> Result<Self, AppError> {
        let Some(fallback) = config.fallback_provider else {
            return Err(primary_error);
        };

        if !config.fallback_enabled || fallback == config.provider {
            return Err(primary_error);
        }

        warn!(
            "Primary LLM provider {} failed to initialize ({}), trying fallback {}",
            config.provider, primary_error, fallback
        );

        Self::create_provider(fallback, config).map_err(|fallback_error| {
            warn!("Fallback LLM provider also failed: {}", fallback_error);
            primary_error
        })
    }

    fn create_provider(
        provider_type: LlmProviderType,
        config: &LlmConfig,
    ) -> Result<Self, AppError> {
        match provider_type {
            LlmProviderType::Groq => {
                let api_key = std::env::var("GROQ_API_KEY").map_err(|_| {
                    AppError::config("GROQ_API_KEY environment variable not set")
                })?;
                Ok(Self::Groq(GroqProvider::new(
                    api_key,
                    Duration::from_secs(config.timeout_secs),
                )?))
            }
            LlmProviderType::Local => {
                let provider = if config.local_base_url.is_empty() {
                    OpenAiCompatibleProvider::from_env()?
                } else {
                    OpenAiCompatibleProvider::new(OpenAiCompatibleConfig {
                        base_url: config.local_base_url.clone(),
                        api_key: None,
                        default_model: config.local_model.clone(),
                        timeout: Duration::from_secs(config.timeout_secs),
                    })?
                };
                Ok(Self::Local(provider))
            }
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Groq(p) => p.name(),
            Self::Local(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Groq(p) => p.display_name(),
            Self::Local(p) => p.display_name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Groq(p) => p.default_model(),
            Self::Local(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match self {
            Self::Groq(p) => p.complete(request).await,
            Self::Local(p) => p.complete(request).await,
        }
    }
}
