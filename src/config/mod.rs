// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports the ServerConfig tree and LLM provider selection types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Configuration management for the Habla Hermano server.
//!
//! All configuration is environment-based; a `.env` file is honored in
//! development. See [`environment::ServerConfig::from_env`].

pub mod environment;

pub use environment::{
    AuthConfig, ContentConfig, DatabaseConfig, LlmConfig, LlmProviderType, LogLevel, ServerConfig,
};
