// ABOUTME: Authentication route handlers for guest sessions, registration, and login
// ABOUTME: Triggers the best-effort guest merge after the primary auth outcome is decided
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Authentication routes.
//!
//! `POST /api/auth/guest` mints an ephemeral guest identity. Registration
//! and login accept an optional guest bearer token; when one is present
//! and valid, the guest's record sets are merged into the account after
//! the signup/login itself has succeeded. Merge failure never fails the
//! auth request; the guest token stays valid so the merge can retry on
//! the next login.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::database::MergeReport;
use crate::errors::AppError;
use crate::models::Identity;
use crate::server::ServerResources;

/// Minimum accepted password length
const MIN_PASSWORD_CHARS: usize = 8;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration and login request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Response for guest session creation
#[derive(Debug, Serialize, Deserialize)]
pub struct GuestSessionResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Guest identity id
    pub identity_id: Uuid,
}

/// Response for registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Account id
    pub user_id: Uuid,
    /// Account email
    pub email: String,
    /// Merge counts when a guest session was folded in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,
}

// ============================================================================
// Routes
// ============================================================================

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/guest", post(Self::handle_guest_session))
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Mint a fresh guest identity token
    async fn handle_guest_session(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let (token, identity) = resources.auth_manager.generate_guest_token()?;

        info!(identity_id = %identity.id, "Created guest session");

        Ok((
            StatusCode::CREATED,
            Json(GuestSessionResponse {
                token,
                identity_id: identity.id,
            }),
        )
            .into_response())
    }

    /// Create an account, then fold in any presented guest session
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CredentialsRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim().to_lowercase();
        validate_credentials(&email, &request.password)?;

        let password_hash = hash_password(&request.password)?;
        let user = resources.database.users().create(&email, &password_hash).await?;
        let token = resources.auth_manager.generate_user_token(user.id)?;

        info!(user_id = %user.id, "Registered new account");

        let merge = merge_presented_guest(&resources, &headers, user.id).await;

        Ok((
            StatusCode::CREATED,
            Json(AuthResponse {
                token,
                user_id: user.id,
                email: user.email,
                merge,
            }),
        )
            .into_response())
    }

    /// Verify credentials, then fold in any presented guest session
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CredentialsRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim().to_lowercase();

        let user = resources
            .database
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        verify_password(&request.password, &user.password_hash)?;
        resources.database.users().touch_last_login(user.id).await?;

        let token = resources.auth_manager.generate_user_token(user.id)?;
        let merge = merge_presented_guest(&resources, &headers, user.id).await;

        Ok((
            StatusCode::OK,
            Json(AuthResponse {
                token,
                user_id: user.id,
                email: user.email,
                merge,
            }),
        )
            .into_response())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::invalid_input("A valid email address is required"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Pull a guest identity out of the request's bearer token, if any.
///
/// Returns `None` for absent, invalid, non-guest, or already-retired
/// tokens; a bad guest token never disturbs the auth request itself.
async fn presented_guest(
    resources: &Arc<ServerResources>,
    headers: &HeaderMap,
) -> Option<Identity> {
    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())?
        .strip_prefix("Bearer ")?;

    let identity = resources.auth_manager.validate_token(token).ok()?;
    if !identity.is_guest {
        return None;
    }

    match resources.reconciler.is_guest_retired(identity.id).await {
        Ok(false) => Some(identity),
        Ok(true) => None,
        Err(e) => {
            warn!("Failed to check guest retirement, skipping merge: {}", e);
            None
        }
    }
}

/// Run the guest merge after authentication succeeded. Best-effort: any
/// failure is logged and absorbed, leaving the guest data in place for a
/// retry on the next login.
async fn merge_presented_guest(
    resources: &Arc<ServerResources>,
    headers: &HeaderMap,
    user_id: Uuid,
) -> Option<MergeReport> {
    let guest = presented_guest(resources, headers).await?;

    match resources
        .reconciler
        .merge_guest_into_user(guest.id, user_id)
        .await
    {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(
                guest_id = %guest.id,
                user_id = %user_id,
                "Guest merge failed, leaving guest data for retry: {}", e
            );
            None
        }
    }
}
