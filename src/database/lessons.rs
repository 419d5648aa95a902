// ABOUTME: Lesson completion record set keyed by (identity, lesson)
// ABOUTME: Applies the monotonic higher-score-wins rule on re-completion
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::database::AccessMode;
use crate::errors::{AppError, AppResult};
use crate::models::Identity;

/// One row of the lesson completion record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompletionEntry {
    /// Row id
    pub id: String,
    /// Owning identity
    pub identity_id: Uuid,
    /// Completed lesson
    pub lesson_id: String,
    /// When the lesson was first completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Best score so far (0-100), if the lesson is scored
    pub score: Option<i64>,
}

/// Lesson completion database operations
pub struct LessonCompletionManager {
    pool: SqlitePool,
}

impl LessonCompletionManager {
    /// Create a new lesson completion manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a completion attempt.
    ///
    /// Creates the entry on first completion. On re-completion the stored
    /// score is overwritten only when the new score is higher (a missing
    /// score compares as 0), so the update is idempotent and monotonic.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record_completion(
        &self,
        identity: Identity,
        lesson_id: &str,
        score: Option<i64>,
    ) -> AppResult<LessonCompletionEntry> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO lesson_completions (id, identity_id, lesson_id, completed_at, score)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(identity_id, lesson_id) DO UPDATE SET
                score = CASE
                    WHEN COALESCE(excluded.score, 0) > COALESCE(lesson_completions.score, 0)
                    THEN excluded.score
                    ELSE lesson_completions.score
                END
            ",
        )
        .bind(&id)
        .bind(identity.id.to_string())
        .bind(lesson_id)
        .bind(now)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record completion: {e}")))?;

        self.find(identity.id, lesson_id)
            .await?
            .ok_or_else(|| AppError::database("Completion row missing after upsert"))
    }

    /// Look up one completion by its natural key
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find(
        &self,
        identity_id: Uuid,
        lesson_id: &str,
    ) -> AppResult<Option<LessonCompletionEntry>> {
        let row = sqlx::query(
            r"
            SELECT id, identity_id, lesson_id, completed_at, score
            FROM lesson_completions
            WHERE identity_id = $1 AND lesson_id = $2
            ",
        )
        .bind(identity_id.to_string())
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find completion: {e}")))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    /// All completions for one identity
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_for_identity(
        &self,
        identity_id: Uuid,
    ) -> AppResult<Vec<LessonCompletionEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, identity_id, lesson_id, completed_at, score
            FROM lesson_completions
            WHERE identity_id = $1
            ORDER BY completed_at ASC
            ",
        )
        .bind(identity_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list completions: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Overwrite the stored score during a merge
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn overwrite_score(
        &self,
        mode: AccessMode,
        entry_id: &str,
        score: Option<i64>,
    ) -> AppResult<()> {
        mode.require_elevated("Overwriting a completion score")?;

        sqlx::query("UPDATE lesson_completions SET score = $1 WHERE id = $2")
            .bind(score)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to overwrite score: {e}")))?;

        Ok(())
    }

    /// Reassign one completion to a different identity, in place
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn reassign_owner(
        &self,
        mode: AccessMode,
        entry_id: &str,
        new_owner: Uuid,
    ) -> AppResult<()> {
        mode.require_elevated("Reassigning completion ownership")?;

        sqlx::query("UPDATE lesson_completions SET identity_id = $1 WHERE id = $2")
            .bind(new_owner.to_string())
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reassign completion: {e}")))?;

        Ok(())
    }

    /// Delete one completion by row id
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn delete_entry(&self, mode: AccessMode, entry_id: &str) -> AppResult<()> {
        mode.require_elevated("Deleting another identity's completion")?;

        sqlx::query("DELETE FROM lesson_completions WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete completion: {e}")))?;

        Ok(())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> AppResult<LessonCompletionEntry> {
    let identity_raw: String = row
        .try_get("identity_id")
        .map_err(|e| AppError::database(format!("Bad completion row: {e}")))?;

    Ok(LessonCompletionEntry {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Bad completion row: {e}")))?,
        identity_id: Uuid::parse_str(&identity_raw)
            .map_err(|e| AppError::database(format!("Bad identity id in completion row: {e}")))?,
        lesson_id: row
            .try_get("lesson_id")
            .map_err(|e| AppError::database(format!("Bad completion row: {e}")))?,
        completed_at: row
            .try_get("completed_at")
            .map_err(|e| AppError::database(format!("Bad completion row: {e}")))?,
        score: row
            .try_get("score")
            .map_err(|e| AppError::database(format!("Bad completion row: {e}")))?,
    })
}
