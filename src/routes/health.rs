// ABOUTME: Health route reporting service liveness and database reachability
// ABOUTME: Unauthenticated endpoint used by deployment probes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::constants::service;
use crate::server::ServerResources;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: `ok` or `degraded`
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Database reachability: `ok` or `unavailable`
    pub database: String,
}

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Response {
        let database_ok = resources.database.ping().await.is_ok();

        let response = HealthResponse {
            status: if database_ok { "ok" } else { "degraded" }.to_owned(),
            service: service::SERVICE_NAME.to_owned(),
            version: service::SERVER_VERSION.to_owned(),
            database: if database_ok { "ok" } else { "unavailable" }.to_owned(),
        };

        let status = if database_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (status, Json(response)).into_response()
    }
}
