// ABOUTME: Groq LLM provider implementation for fast cloud inference
// ABOUTME: Talks to the Groq OpenAI-compatible chat completions API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Groq Provider
//!
//! Implementation of the [`LlmProvider`] trait for Groq's hosted open-source
//! models. Groq is the default backend: fast and cheap enough to run three
//! generation calls per chat turn.
//!
//! ## Configuration
//!
//! Set the `GROQ_API_KEY` environment variable with your API key from
//! <https://console.groq.com/keys>.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use crate::constants::limits::DEFAULT_LLM_TIMEOUT_SECS;
use crate::errors::AppError;

/// Environment variable for the Groq API key
const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default model to use
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Base URL for the Groq API
const API_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Groq API request structure (OpenAI chat completions format)
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    model: String,
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: Option<GroqErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetails {
    message: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Groq chat completion provider
pub struct GroqProvider {
    client: Client,
    api_key: String,
}

impl Debug for GroqProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GroqProvider")
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

impl GroqProvider {
    /// Create a provider with an explicit API key and request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from the `GROQ_API_KEY` environment variable
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is not set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var(GROQ_API_KEY_ENV).map_err(|_| {
            AppError::config(format!("{GROQ_API_KEY_ENV} environment variable not set"))
        })?;
        Self::new(api_key, Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS))
    }

    fn api_url(path: &str) -> String {
        format!("{API_BASE_URL}/{path}")
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<GroqMessage> {
        messages
            .iter()
            .map(|m| GroqMessage {
                role: m.role.as_str().to_owned(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<GroqErrorResponse>(body)
            .ok()
            .and_then(|e| e.error)
            .map_or_else(|| body.to_owned(), |d| d.message);

        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            AppError::external_unavailable("Groq", format!("{status}: {detail}"))
        } else {
            AppError::external_service("Groq", format!("{status}: {detail}"))
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!("Sending chat completion request to Groq");

        let groq_request = GroqRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(Self::api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Groq API: {}", e);
                if e.is_timeout() {
                    AppError::external_unavailable("Groq", format!("Request timed out: {e}"))
                } else {
                    AppError::external_unavailable("Groq", format!("Failed to connect: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let groq_response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Groq API response: {}", e);
            AppError::external_service("Groq", format!("Failed to parse response: {e}"))
        })?;

        let choice = groq_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Groq", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from Groq: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: groq_response.model,
            usage: groq_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_convert_messages_preserves_order_and_roles() {
        let messages = vec![
            ChatMessage::system("instructions"),
            ChatMessage::user("hola"),
            ChatMessage::assistant("¡Hola!"),
        ];

        let converted = GroqProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, MessageRole::System.as_str());
        assert_eq!(converted[1].content, "hola");
        assert_eq!(converted[2].role, "assistant");
    }

    #[test]
    fn test_parse_error_response_classifies_status() {
        let overloaded = GroqProvider::parse_error_response(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":{"message":"overloaded"}}"#,
        );
        assert_eq!(overloaded.http_status(), 503);

        let bad_request = GroqProvider::parse_error_response(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"bad model"}}"#,
        );
        assert_eq!(bad_request.http_status(), 502);
    }
}
