// ABOUTME: Server binary wiring configuration, logging, database, and the LLM provider
// ABOUTME: Parses CLI overrides, builds ServerResources, and runs the HTTP server
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Habla Hermano Server Binary
//!
//! Starts the tutoring API: loads environment configuration, connects and
//! migrates the database, selects the LLM provider, loads the lesson
//! catalog, and serves HTTP until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use habla_hermano::{
    auth::AuthManager,
    config::ServerConfig,
    content::LessonCatalog,
    database::Database,
    llm::ChatProvider,
    logging::LoggingConfig,
    server::{self, ServerResources},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "habla-hermano-server")]
#[command(about = "Habla Hermano - LLM-driven language tutoring API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override lessons content directory
    #[arg(long)]
    lessons_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingConfig::from_env()
        .init()
        .context("Failed to initialize logging")?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(dir) = args.lessons_dir {
        config.content.lessons_dir = dir.into();
    }

    let database = Database::new(&config.database.url)
        .await
        .context("Failed to open database")?;
    info!("Database ready at {}", config.database.url);

    let provider = ChatProvider::from_config(&config.llm).context("Failed to initialize LLM provider")?;

    let catalog = LessonCatalog::load_from_dir(&config.content.lessons_dir)
        .context("Failed to load lesson catalog")?;

    let auth_manager = AuthManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiry_hours,
        config.auth.guest_token_expiry_hours,
    );

    let resources = Arc::new(ServerResources::new(
        database,
        Arc::new(provider),
        auth_manager,
        catalog,
        config.cors_allowed_origins.clone(),
    ));

    server::serve(resources, config.http_port).await
}
