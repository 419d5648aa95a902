// ABOUTME: Main library entry point for the Habla Hermano tutoring server
// ABOUTME: Exposes the conversation pipeline, record sets, progress aggregate, and HTTP surface
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

#![deny(unsafe_code)]

//! # Habla Hermano
//!
//! A language-tutoring backend that teaches Spanish, German, and French
//! through LLM-driven chat, YAML-authored micro-lessons, and a progress
//! dashboard.
//!
//! ## Architecture
//!
//! - **LLM providers**: pluggable chat completion backends (Groq, local
//!   `OpenAI`-compatible servers)
//! - **Tutor**: the conversation pipeline with level-based routing between
//!   response, scaffold, and analysis stages
//! - **Database**: conversation checkpoints plus three per-identity record
//!   sets (vocabulary, sessions, lesson completions)
//! - **Progress**: read-side dashboard statistics and chart series
//! - **Routes**: the axum HTTP surface consumed by the web client
//!
//! ## Example
//!
//! ```rust,no_run
//! use habla_hermano::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Identity tokens and password handling
pub mod auth;

/// Configuration management
pub mod config;

/// Application constants and environment defaults
pub mod constants;

/// Lesson catalog loaded from YAML content
pub mod content;

/// Checkpoint store, record sets, and the identity merge reconciler
pub mod database;

/// Unified error handling
pub mod errors;

/// LLM provider abstraction and implementations
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Core domain models
pub mod models;

/// Read-side progress aggregation
pub mod progress;

/// HTTP route handlers
pub mod routes;

/// Server composition root and runner
pub mod server;

/// Conversation pipeline and its stages
pub mod tutor;
