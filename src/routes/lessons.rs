// ABOUTME: Lesson route handlers for the catalog and completion tracking
// ABOUTME: Validates scores and applies passing completions to the vocabulary record set
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Lesson routes.
//!
//! The catalog is read-only; completion writes go to the lesson completion
//! record set with the monotonic higher-score-wins rule. A passing
//! completion also credits the lesson's vocabulary as correctly used,
//! as a detached best-effort task.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::limits::{LESSON_PASSING_SCORE, MAX_LESSON_SCORE};
use crate::content::Lesson;
use crate::errors::AppError;
use crate::models::{Identity, TargetLanguage, VocabularyItem};
use crate::routes::authenticate;
use crate::server::ServerResources;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the lesson listing
#[derive(Debug, Deserialize)]
pub struct LessonListQuery {
    /// Optional language filter (es, de, fr)
    #[serde(default)]
    pub language: Option<String>,
}

/// Completion request body
#[derive(Debug, Deserialize)]
pub struct CompleteLessonRequest {
    /// Score achieved (0-100); omitted for unscored lessons
    #[serde(default)]
    pub score: Option<i64>,
}

/// Completion response
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteLessonResponse {
    /// Completed lesson
    pub lesson_id: String,
    /// Best score on record after this attempt
    pub score: Option<i64>,
    /// When the lesson was first completed
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Routes
// ============================================================================

/// Lesson routes
pub struct LessonRoutes;

impl LessonRoutes {
    /// Create all lesson routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/lessons", get(Self::handle_list))
            .route("/api/lessons/:id", get(Self::handle_get))
            .route("/api/lessons/:id/complete", post(Self::handle_complete))
            .with_state(resources)
    }

    /// List lesson summaries, optionally filtered by language
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<LessonListQuery>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?;

        let language = match query.language.as_deref() {
            Some(code) => Some(
                TargetLanguage::from_code(code)
                    .ok_or_else(|| AppError::invalid_input("Language must be one of es, de, fr"))?,
            ),
            None => None,
        };

        let summaries = resources.catalog.summaries(language);
        Ok((StatusCode::OK, Json(summaries)).into_response())
    }

    /// Fetch one lesson with its full content
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lesson_id): Path<String>,
    ) -> Result<Response, AppError> {
        authenticate(&headers, &resources).await?;

        let lesson = resources
            .catalog
            .get(&lesson_id)
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id}")))?;

        Ok((StatusCode::OK, Json(lesson.clone())).into_response())
    }

    /// Record a completion attempt
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(lesson_id): Path<String>,
        Json(request): Json<CompleteLessonRequest>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&headers, &resources).await?;

        let lesson = resources
            .catalog
            .get(&lesson_id)
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id}")))?
            .clone();

        if let Some(score) = request.score {
            if !(0..=MAX_LESSON_SCORE).contains(&score) {
                return Err(AppError::out_of_range(format!(
                    "Score must be between 0 and {MAX_LESSON_SCORE}"
                )));
            }
        }

        let entry = resources
            .database
            .lessons()
            .record_completion(identity, &lesson_id, request.score)
            .await?;

        if request.score.unwrap_or(0) >= LESSON_PASSING_SCORE {
            spawn_vocabulary_credit(resources.clone(), identity, &lesson);
        }

        Ok((
            StatusCode::OK,
            Json(CompleteLessonResponse {
                lesson_id: entry.lesson_id,
                score: entry.score,
                completed_at: entry.completed_at,
            }),
        )
            .into_response())
    }
}

/// Credit the lesson's vocabulary as correctly used, detached from the
/// response path.
fn spawn_vocabulary_credit(resources: Arc<ServerResources>, identity: Identity, lesson: &Lesson) {
    let language = lesson.language;
    let items: Vec<VocabularyItem> = lesson
        .vocabulary
        .iter()
        .map(|v| VocabularyItem {
            word: v.word.clone(),
            translation: v.translation.clone(),
            part_of_speech: v.part_of_speech.clone(),
        })
        .collect();

    tokio::spawn(async move {
        let vocabulary = resources.database.vocabulary();
        for item in &items {
            if let Err(e) = vocabulary.record_correct_use(identity, language, item).await {
                warn!(word = %item.word, "Failed to credit lesson vocabulary: {}", e);
            }
        }
    });
}
