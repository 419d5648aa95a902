// ABOUTME: Chat route handler running the conversation pipeline for one learner turn
// ABOUTME: Captures vocabulary and session activity as detached best-effort side effects
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Chat route.
//!
//! `POST /api/chat` accepts one learner message plus the caller-selected
//! level and language, runs the pipeline, and returns the tutor's reply
//! with its scaffolding and analysis. Vocabulary and session capture run
//! afterwards as a detached task; their failure is logged, never joined
//! into the response path.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::limits::MAX_MESSAGE_CHARS;
use crate::errors::AppError;
use crate::models::{
    ConversationState, GrammarCorrection, Identity, Scaffolding, TargetLanguage, VocabularyItem,
};
use crate::routes::authenticate;
use crate::server::ServerResources;
use crate::tutor::ChatTurn;

// ============================================================================
// Request/Response Types
// ============================================================================

/// One learner chat turn
#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    /// The learner's message
    pub message: String,
    /// Proficiency level tag; unknown tags fail open to the direct path
    pub level: String,
    /// Target language code (es, de, fr)
    pub language: String,
}

/// The tutor's reply with its attached learning data
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    /// The tutor's utterance
    pub reply: String,
    /// Learning aids for the reply (disabled outside beginner levels)
    pub scaffolding: Scaffolding,
    /// Corrections for the learner's message, at most 3
    pub grammar_feedback: Vec<GrammarCorrection>,
    /// Vocabulary surfaced from the learner's message, at most 5
    pub new_vocabulary: Vec<VocabularyItem>,
}

// ============================================================================
// Routes
// ============================================================================

/// Chat routes
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::handle_chat_turn))
            .with_state(resources)
    }

    /// Run one pipeline invocation for the caller's conversation thread
    async fn handle_chat_turn(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatTurnRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&headers, &resources).await?;

        let message = request.message.trim().to_owned();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message must not be empty"));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::out_of_range(format!(
                "Message exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let language = TargetLanguage::from_code(&request.language)
            .ok_or_else(|| AppError::invalid_input("Language must be one of es, de, fr"))?;

        let state = resources
            .pipeline
            .run(ChatTurn {
                identity,
                message,
                level_tag: request.level,
                language,
            })
            .await?;

        let reply = state
            .last_tutor_turn()
            .map(|t| t.text.clone())
            .unwrap_or_default();

        spawn_capture(resources.clone(), identity, language, &state);

        Ok((
            StatusCode::OK,
            Json(ChatTurnResponse {
                reply,
                scaffolding: state.scaffolding,
                grammar_feedback: state.grammar_feedback,
                new_vocabulary: state.new_vocabulary,
            }),
        )
            .into_response())
    }
}

// ============================================================================
// Best-effort capture
// ============================================================================

/// Record vocabulary encounters and session activity on a detached task.
/// The chat response is already finalized when this runs.
fn spawn_capture(
    resources: Arc<ServerResources>,
    identity: Identity,
    language: TargetLanguage,
    state: &ConversationState,
) {
    let new_vocabulary = state.new_vocabulary.clone();
    let level = state.level;

    tokio::spawn(async move {
        let vocabulary = resources.database.vocabulary();
        for item in &new_vocabulary {
            if let Err(e) = vocabulary.record_encounter(identity, language, item).await {
                warn!(word = %item.word, "Failed to capture vocabulary encounter: {}", e);
            }
        }

        if let Err(e) = resources
            .database
            .sessions()
            .record_activity(identity, language, level, new_vocabulary.len() as i64)
            .await
        {
            warn!("Failed to capture session activity: {}", e);
        }
    });
}
