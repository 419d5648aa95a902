// ABOUTME: Progress route handlers serving dashboard statistics and chart series
// ABOUTME: Thin HTTP layer over the read-side ProgressTracker aggregate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Progress routes. Read failures surface as errors; a dashboard of
//! zeros would misread as "no progress" rather than "unknown".

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::constants::limits::DEFAULT_CHART_DAYS;
use crate::errors::AppError;
use crate::models::TargetLanguage;
use crate::routes::authenticate;
use crate::server::ServerResources;

/// Longest chart window the API serves
const MAX_CHART_DAYS: u32 = 365;

/// Query parameters for both progress endpoints
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Language the dashboard is scoped to
    pub language: String,
    /// Trailing window for chart data
    #[serde(default = "default_days")]
    pub days: u32,
}

const fn default_days() -> u32 {
    DEFAULT_CHART_DAYS
}

/// Progress routes
pub struct ProgressRoutes;

impl ProgressRoutes {
    /// Create all progress routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/progress/stats", get(Self::handle_stats))
            .route("/api/progress/chart", get(Self::handle_chart))
            .with_state(resources)
    }

    /// Dashboard statistics for the caller
    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ProgressQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&headers, &resources).await?;
        let language = parse_language(&query.language)?;

        let stats = resources
            .progress
            .dashboard_stats(identity.id, language)
            .await?;

        Ok((StatusCode::OK, Json(stats)).into_response())
    }

    /// Chart series for the caller
    async fn handle_chart(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ProgressQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&headers, &resources).await?;
        let language = parse_language(&query.language)?;
        let days = query.days.clamp(1, MAX_CHART_DAYS);

        let chart = resources
            .progress
            .chart_data(identity.id, language, days)
            .await?;

        Ok((StatusCode::OK, Json(chart)).into_response())
    }
}

fn parse_language(code: &str) -> Result<TargetLanguage, AppError> {
    TargetLanguage::from_code(code)
        .ok_or_else(|| AppError::invalid_input("Language must be one of es, de, fr"))
}
