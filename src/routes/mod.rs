// ABOUTME: HTTP route handlers for auth, chat, lessons, progress, and health
// ABOUTME: Shares the bearer-token authentication helper used by every protected handler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # HTTP Routes
//!
//! Route handler structs in the `Routes::routes(Arc<ServerResources>)`
//! style. Handlers resolve the caller's identity from the `Authorization`
//! header; the core never authenticates beyond that resolution.

pub mod auth;
pub mod chat;
pub mod health;
pub mod lessons;
pub mod progress;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;

use crate::errors::{AppError, AppResult};
use crate::models::Identity;
use crate::server::ServerResources;

/// Assemble every API route into one router
pub fn api_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(chat::ChatRoutes::routes(resources.clone()))
        .merge(lessons::LessonRoutes::routes(resources.clone()))
        .merge(progress::ProgressRoutes::routes(resources.clone()))
        .merge(health::HealthRoutes::routes(resources))
}

/// Resolve the caller's identity from the `Authorization` header.
///
/// Guest tokens whose identity has already been merged into an account are
/// rejected; the merged guest token must not be reusable.
///
/// # Errors
///
/// Returns an auth error when the header is missing, malformed, expired,
/// or names a retired guest.
pub async fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<Identity> {
    let header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("Authorization header must be a bearer token"))?;

    let identity = resources.auth_manager.validate_token(token)?;

    if identity.is_guest && resources.reconciler.is_guest_retired(identity.id).await? {
        return Err(AppError::auth_invalid(
            "Guest session has already been merged into an account",
        ));
    }

    Ok(identity)
}
