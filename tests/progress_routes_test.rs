// ABOUTME: Integration tests for the progress and health HTTP endpoints
// ABOUTME: Covers stats and chart payload shapes, language validation, and liveness
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{create_test_resources, guest_bearer};
use helpers::axum_test::AxumTestRequest;
use helpers::mock_provider::MockProvider;

use axum::http::StatusCode;
use habla_hermano::models::{Identity, TargetLanguage, VocabularyItem};
use habla_hermano::progress::{ChartData, DashboardStats};
use habla_hermano::routes::health::{HealthResponse, HealthRoutes};
use habla_hermano::routes::progress::ProgressRoutes;

async fn seed_progress(
    resources: &std::sync::Arc<habla_hermano::server::ServerResources>,
    identity: Identity,
) {
    let vocabulary = resources.database.vocabulary();
    for word in ["hola", "gracias", "adiós"] {
        vocabulary
            .record_encounter(
                identity,
                TargetLanguage::Es,
                &VocabularyItem {
                    word: word.to_owned(),
                    translation: "test".to_owned(),
                    part_of_speech: None,
                },
            )
            .await
            .unwrap();
    }
    resources
        .database
        .sessions()
        .record_activity(
            identity,
            TargetLanguage::Es,
            habla_hermano::models::CefrLevel::A0,
            3,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stats_endpoint_returns_dashboard() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let (bearer, identity) = guest_bearer(&resources);
    seed_progress(&resources, identity).await;

    let router = ProgressRoutes::routes(resources);
    let response = AxumTestRequest::get("/api/progress/stats?language=es")
        .header("authorization", &bearer)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let stats: DashboardStats = response.json();
    assert_eq!(stats.total_words, 3);
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.words_learned_today, 3);
}

#[tokio::test]
async fn test_chart_endpoint_honors_days_window() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let (bearer, identity) = guest_bearer(&resources);
    seed_progress(&resources, identity).await;

    let router = ProgressRoutes::routes(resources);
    let response = AxumTestRequest::get("/api/progress/chart?language=es&days=14")
        .header("authorization", &bearer)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let chart: ChartData = response.json();
    assert_eq!(chart.vocab_growth.len(), 14);
    assert_eq!(chart.accuracy_trend.len(), 14);
    assert_eq!(chart.vocab_growth.last().unwrap().cumulative_count, 3);
}

#[tokio::test]
async fn test_progress_rejects_unknown_language() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let (bearer, _) = guest_bearer(&resources);

    let router = ProgressRoutes::routes(resources);
    let response = AxumTestRequest::get("/api/progress/stats?language=xx")
        .header("authorization", &bearer)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_requires_authentication() {
    let resources = create_test_resources(MockProvider::always_ok()).await;

    let router = ProgressRoutes::routes(resources);
    let response = AxumTestRequest::get("/api/progress/stats?language=es")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let resources = create_test_resources(MockProvider::always_ok()).await;

    let router = HealthRoutes::routes(resources);
    let response = AxumTestRequest::get("/health").send(router).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "ok");
    assert_eq!(body.database, "ok");
}
