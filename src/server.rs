// ABOUTME: Composition root wiring database, LLM provider, catalog, and auth into shared resources
// ABOUTME: Assembles the axum router with tracing and CORS layers and runs the HTTP server
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Server Composition
//!
//! [`ServerResources`] is the single composition root: every client handle
//! (database pool, LLM provider, lesson catalog, auth manager) is
//! constructed once here and shared via `Arc`. Components receive their
//! dependencies explicitly; there is no ambient global state.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthManager;
use crate::content::LessonCatalog;
use crate::database::{Database, IdentityMergeReconciler};
use crate::llm::LlmProvider;
use crate::progress::ProgressTracker;
use crate::routes;
use crate::tutor::ConversationPipeline;

/// Shared server state handed to every route handler
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Chat completion provider
    pub chat_provider: Arc<dyn LlmProvider>,
    /// Identity token manager
    pub auth_manager: AuthManager,
    /// Lesson catalog
    pub catalog: LessonCatalog,
    /// Conversation pipeline
    pub pipeline: ConversationPipeline,
    /// Read-side progress aggregate
    pub progress: ProgressTracker,
    /// Guest merge reconciler
    pub reconciler: IdentityMergeReconciler,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
}

impl ServerResources {
    /// Create server resources with proper sharing of the underlying handles
    #[must_use]
    pub fn new(
        database: Database,
        chat_provider: Arc<dyn LlmProvider>,
        auth_manager: AuthManager,
        catalog: LessonCatalog,
        cors_allowed_origins: Vec<String>,
    ) -> Self {
        let pipeline = ConversationPipeline::new(chat_provider.clone(), database.checkpoints());
        let progress = ProgressTracker::new(database.clone());
        let reconciler = IdentityMergeReconciler::new(database.clone());

        Self {
            database,
            chat_provider,
            auth_manager,
            catalog,
            pipeline,
            progress,
            reconciler,
            cors_allowed_origins,
        }
    }
}

/// Build the full application router with middleware layers
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = if resources.cors_allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = resources
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    };

    routes::api_router(resources)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind and serve until shutdown
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(resources: Arc<ServerResources>, http_port: u16) -> Result<()> {
    let app = router(resources);
    let addr = format!("0.0.0.0:{http_port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install shutdown signal handler: {}", e);
    }
    info!("Shutdown signal received");
}
