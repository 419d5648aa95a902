// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, provider selection, and runtime configuration parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Environment-based configuration management for production deployment

use crate::constants::{env_config, limits};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Which LLM backend serves completion requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Groq cloud inference (default)
    #[default]
    Groq,
    /// OpenAI-compatible local server (Ollama, vLLM, LocalAI)
    Local,
}

impl LlmProviderType {
    /// Environment variable that selects the provider
    pub const ENV_VAR: &'static str = "LLM_PROVIDER";

    /// Read the configured provider from the environment
    #[must_use]
    pub fn from_env() -> Self {
        env::var(Self::ENV_VAR)
            .map(|v| Self::from_str_or_default(&v))
            .unwrap_or_default()
    }

    /// Parse from string with fallback to the default provider
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "local" | "ollama" | "vllm" | "localai" => Self::Local,
            _ => Self::Groq,
        }
    }

    /// Read the fallback provider, if one is configured
    #[must_use]
    pub fn fallback_from_env() -> Option<Self> {
        env::var("LLM_PROVIDER_FALLBACK")
            .ok()
            .map(|v| Self::from_str_or_default(&v))
    }

    /// Whether falling back to the secondary provider is enabled
    #[must_use]
    pub fn is_fallback_enabled() -> bool {
        env::var("LLM_FALLBACK_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }
}

impl std::fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Groq => write!(f, "groq"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Top-level server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Identity token configuration
    pub auth: AuthConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Lesson content configuration
    pub content: ContentConfig,
    /// Allowed CORS origins; empty means same-origin only
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path)
    pub url: String,
    /// Enable database migrations on startup
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for identity tokens
    pub jwt_secret: String,
    /// User token expiry in hours
    pub jwt_expiry_hours: u64,
    /// Guest token expiry in hours
    pub guest_token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Primary provider
    pub provider: LlmProviderType,
    /// Optional fallback provider tried when the primary fails to initialize
    pub fallback_provider: Option<LlmProviderType>,
    /// Whether fallback is enabled
    pub fallback_enabled: bool,
    /// Per-call completion timeout in seconds
    pub timeout_secs: u64,
    /// Base URL for the local OpenAI-compatible server
    pub local_base_url: String,
    /// Model name for the local server
    pub local_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding YAML lesson definitions
    pub lessons_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing (`JWT_SECRET`)
    /// or a present variable fails to parse.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            http_port: env_config::http_port(),
            log_level: LogLevel::from_str_or_default(&env_config::log_level()),

            database: DatabaseConfig {
                url: env_config::database_url(),
                auto_migrate: env_var_or("AUTO_MIGRATE", "true")?
                    .parse()
                    .context("Invalid AUTO_MIGRATE value")?,
            },

            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .context("JWT_SECRET environment variable is required")?,
                jwt_expiry_hours: env_var_or(
                    "JWT_EXPIRY_HOURS",
                    &limits::USER_TOKEN_EXPIRY_HOURS.to_string(),
                )?
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
                guest_token_expiry_hours: env_var_or(
                    "GUEST_TOKEN_EXPIRY_HOURS",
                    &limits::GUEST_TOKEN_EXPIRY_HOURS.to_string(),
                )?
                .parse()
                .context("Invalid GUEST_TOKEN_EXPIRY_HOURS value")?,
            },

            llm: LlmConfig {
                provider: LlmProviderType::from_env(),
                fallback_provider: LlmProviderType::fallback_from_env(),
                fallback_enabled: LlmProviderType::is_fallback_enabled(),
                timeout_secs: env_var_or(
                    "LLM_TIMEOUT_SECS",
                    &limits::DEFAULT_LLM_TIMEOUT_SECS.to_string(),
                )?
                .parse()
                .context("Invalid LLM_TIMEOUT_SECS value")?,
                local_base_url: env_var_or("LOCAL_LLM_BASE_URL", "http://localhost:11434/v1")?,
                local_model: env_var_or("LOCAL_LLM_MODEL", "llama3.1:8b")?,
            },

            content: ContentConfig {
                lessons_dir: PathBuf::from(env_config::lessons_dir()),
            },

            cors_allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "")?
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        };

        info!(
            "Configuration loaded: port={}, provider={}, lessons_dir={}",
            config.http_port,
            config.llm.provider,
            config.content.lessons_dir.display()
        );

        Ok(config)
    }
}

/// Read an environment variable, substituting a default when unset
fn env_var_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_owned()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str_or_default("nonsense"), LogLevel::Info);
    }

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(
            LlmProviderType::from_str_or_default("ollama"),
            LlmProviderType::Local
        );
        assert_eq!(
            LlmProviderType::from_str_or_default("groq"),
            LlmProviderType::Groq
        );
        assert_eq!(
            LlmProviderType::from_str_or_default("something-else"),
            LlmProviderType::Groq
        );
    }

    #[test]
    #[serial]
    fn test_from_env_requires_jwt_secret() {
        std::env::remove_var("JWT_SECRET");
        let result = ServerConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::set_var("JWT_SECRET", "test-secret");
        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("LLM_TIMEOUT_SECS");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8081);
        assert_eq!(config.llm.timeout_secs, 30);
        assert!(config.database.auto_migrate);

        std::env::remove_var("JWT_SECRET");
    }
}
