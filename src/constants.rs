// ABOUTME: System-wide constants and configuration values for Habla Hermano
// ABOUTME: Contains tutoring limits, environment-based defaults, and service identity
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! This module provides both hardcoded constants and environment variable configuration.

/// Service identity
pub mod service {
    /// Service name used in logs and health responses
    pub const SERVICE_NAME: &str = "habla-hermano-server";

    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Default ports
pub mod ports {
    /// Default HTTP API port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Hard limits on tutoring output
pub mod limits {
    /// Maximum grammar corrections recorded per pipeline run
    pub const MAX_GRAMMAR_FEEDBACK: usize = 3;

    /// Maximum vocabulary items recorded per pipeline run
    pub const MAX_NEW_VOCABULARY: usize = 5;

    /// Lower bound a well-formed word bank should reach
    pub const WORD_BANK_MIN: usize = 4;

    /// Upper bound applied to generator output
    pub const WORD_BANK_MAX: usize = 6;

    /// Lesson scores are percentages
    pub const MAX_LESSON_SCORE: i64 = 100;

    /// Completions at or above this score count the lesson's vocabulary as used correctly
    pub const LESSON_PASSING_SCORE: i64 = 70;

    /// Chat activity within this window continues the current learning session
    pub const SESSION_WINDOW_MINUTES: i64 = 30;

    /// Default timeout for a single LLM completion call
    pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

    /// Default user token lifetime
    pub const USER_TOKEN_EXPIRY_HOURS: u64 = 24;

    /// Default guest token lifetime
    pub const GUEST_TOKEN_EXPIRY_HOURS: u64 = 72;

    /// Default trailing window for progress charts
    pub const DEFAULT_CHART_DAYS: u32 = 30;

    /// Maximum accepted learner message length in characters
    pub const MAX_MESSAGE_CHARS: usize = 2_000;
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Get HTTP server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .unwrap_or_else(|_| super::ports::DEFAULT_HTTP_PORT.to_string())
            .parse()
            .unwrap_or(super::ports::DEFAULT_HTTP_PORT)
    }

    /// Get database URL from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/habla.db".into())
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into())
    }

    /// Get lesson content directory from environment or default
    #[must_use]
    pub fn lessons_dir() -> String {
        env::var("LESSONS_DIR").unwrap_or_else(|_| "./content/lessons".into())
    }
}
