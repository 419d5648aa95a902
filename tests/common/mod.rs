// ABOUTME: Shared fixtures building in-memory server resources for integration tests
// ABOUTME: Provides database, catalog, and token helpers used across test suites
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;

use habla_hermano::auth::AuthManager;
use habla_hermano::content::{Lesson, LessonCatalog, LessonVocabulary};
use habla_hermano::database::Database;
use habla_hermano::llm::LlmProvider;
use habla_hermano::models::{CefrLevel, Identity, TargetLanguage};
use habla_hermano::server::ServerResources;

/// JWT secret used by every test fixture
pub const TEST_JWT_SECRET: &str = "habla-test-secret";

/// Open a fresh in-memory database with migrations applied
pub async fn create_test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

/// Auth manager matching the test fixtures
pub fn create_test_auth_manager() -> AuthManager {
    AuthManager::new(TEST_JWT_SECRET, 24, 72)
}

/// A small catalog with one lesson per language
pub fn create_test_catalog() -> LessonCatalog {
    let lessons = vec![
        Lesson {
            id: "greetings-001".into(),
            title: "First Greetings".into(),
            language: TargetLanguage::Es,
            level: CefrLevel::A0,
            description: "Say hello.".into(),
            vocabulary: vec![
                LessonVocabulary {
                    word: "hola".into(),
                    translation: "hello".into(),
                    part_of_speech: None,
                },
                LessonVocabulary {
                    word: "gracias".into(),
                    translation: "thank you".into(),
                    part_of_speech: None,
                },
            ],
            phrases: vec![],
        },
        Lesson {
            id: "gruesse-001".into(),
            title: "Erste Grüße".into(),
            language: TargetLanguage::De,
            level: CefrLevel::A0,
            description: "Say hello in German.".into(),
            vocabulary: vec![LessonVocabulary {
                word: "hallo".into(),
                translation: "hello".into(),
                part_of_speech: None,
            }],
            phrases: vec![],
        },
    ];
    LessonCatalog::new(lessons).expect("Failed to build test catalog")
}

/// Build full server resources around the given provider
pub async fn create_test_resources(provider: Arc<dyn LlmProvider>) -> Arc<ServerResources> {
    let database = create_test_database().await;
    Arc::new(ServerResources::new(
        database,
        provider,
        create_test_auth_manager(),
        create_test_catalog(),
        Vec::new(),
    ))
}

/// Mint a guest bearer header value against the shared test secret
pub fn guest_bearer(resources: &Arc<ServerResources>) -> (String, Identity) {
    let (token, identity) = resources
        .auth_manager
        .generate_guest_token()
        .expect("Failed to mint guest token");
    (format!("Bearer {token}"), identity)
}
