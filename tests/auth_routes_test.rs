// ABOUTME: Integration tests for guest sessions, registration, login, and the guest merge
// ABOUTME: Verifies merge reporting, guest token retirement, and credential validation
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
use habla_hermano::routes::auth::{AuthResponse, AuthRoutes, GuestSessionResponse};
use habla_hermano::routes::chat::ChatRoutes;
use serde_json::json;

fn item(word: &str) -> VocabularyItem {
    VocabularyItem {
        word: word.to_owned(),
        translation: "test".to_owned(),
        part_of_speech: None,
    }
}

#[tokio::test]
async fn test_guest_session_mints_usable_token() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let router = AuthRoutes::routes(resources.clone());

    let response = AxumTestRequest::post("/api/auth/guest").send(router).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: GuestSessionResponse = response.json();
    let identity = resources.auth_manager.validate_token(&body.token).unwrap();
    assert!(identity.is_guest);
    assert_eq!(identity.id, body.identity_id);
}

#[tokio::test]
async fn test_register_creates_account_and_merges_guest_data() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let (bearer, guest) = guest_bearer(&resources);

    // Seed some guest progress before signup
    resources
        .database
        .vocabulary()
        .record_encounter(guest, TargetLanguage::Es, &item("hola"))
        .await
        .unwrap();
    resources
        .database
        .vocabulary()
        .record_encounter(guest, TargetLanguage::Es, &item("gracias"))
        .await
        .unwrap();

    let router = AuthRoutes::routes(resources.clone());
    let response = AxumTestRequest::post("/api/auth/register")
        .header("authorization", &bearer)
        .json(&json!({"email": "ana@example.com", "password": "correcthorse"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: AuthResponse = response.json();
    assert_eq!(body.email, "ana@example.com");

    let merge = body.merge.expect("Expected a merge report");
    assert_eq!(merge.vocabulary_merged, 2);

    // The guest's words now belong to the account
    let moved = resources
        .database
        .vocabulary()
        .list_for_language(body.user_id, TargetLanguage::Es)
        .await
        .unwrap();
    assert_eq!(moved.len(), 2);
}

#[tokio::test]
async fn test_merged_guest_token_is_rejected_afterwards() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let (bearer, _) = guest_bearer(&resources);

    let auth_router = AuthRoutes::routes(resources.clone());
    let response = AxumTestRequest::post("/api/auth/register")
        .header("authorization", &bearer)
        .json(&json!({"email": "max@example.com", "password": "correcthorse"}))
        .send(auth_router)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    // The retired guest token must not work on protected routes anymore
    let chat_router = ChatRoutes::routes(resources);
    let response = AxumTestRequest::post("/api/chat")
        .header("authorization", &bearer)
        .json(&json!({"message": "hola", "level": "A0", "language": "es"}))
        .send(chat_router)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_round_trip_with_merge_on_second_device() {
    let resources = create_test_resources(MockProvider::always_ok()).await;

    // Register without any guest session
    let router = AuthRoutes::routes(resources.clone());
    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "claire@example.com", "password": "correcthorse"}))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let registered: AuthResponse = response.json();
    assert!(registered.merge.is_none());

    // Later, a guest session accumulates data and then logs in
    let (guest_token, guest) = guest_bearer(&resources);
    resources
        .database
        .vocabulary()
        .record_encounter(guest, TargetLanguage::Fr, &item("bonjour"))
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/auth/login")
        .header("authorization", &guest_token)
        .json(&json!({"email": "claire@example.com", "password": "correcthorse"}))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: AuthResponse = response.json();
    assert_eq!(body.user_id, registered.user_id);
    assert_eq!(body.merge.unwrap().vocabulary_merged, 1);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let router = AuthRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "sam@example.com", "password": "correcthorse"}))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({"email": "sam@example.com", "password": "wronghorse1"}))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validates_credentials() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let router = AuthRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "not-an-email", "password": "correcthorse"}))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "ok@example.com", "password": "short"}))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let router = AuthRoutes::routes(resources);

    let first = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "dup@example.com", "password": "correcthorse"}))
        .send(router.clone())
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "dup@example.com", "password": "correcthorse"}))
        .send(router)
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_token_is_not_treated_as_guest_on_login() {
    let resources = create_test_resources(MockProvider::always_ok()).await;
    let router = AuthRoutes::routes(resources.clone());

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({"email": "lee@example.com", "password": "correcthorse"}))
        .send(router.clone())
        .await;
    let registered: AuthResponse = response.json();

    // Logging in while presenting a user token must not attempt a merge
    let response = AxumTestRequest::post("/api/auth/login")
        .header("authorization", &format!("Bearer {}", registered.token))
        .json(&json!({"email": "lee@example.com", "password": "correcthorse"}))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AuthResponse = response.json();
    assert!(body.merge.is_none());
}

#[tokio::test]
async fn test_identity_helper_round_trip() {
    // Guards the thread id contract the checkpoint store keys on
    let guest = Identity::new_guest();
    assert_eq!(guest.thread_id(), format!("user:{}", guest.id));
}
