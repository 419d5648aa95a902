// ABOUTME: Learning session record set tracking per-identity study activity
// ABOUTME: Reuses an open session within the activity window and increments its counters
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::constants::limits::SESSION_WINDOW_MINUTES;
use crate::database::AccessMode;
use crate::errors::{AppError, AppResult};
use crate::models::{CefrLevel, Identity, TargetLanguage};

/// One row of the learning session record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSessionEntry {
    /// Row id
    pub id: String,
    /// Owning identity
    pub identity_id: Uuid,
    /// When the session opened
    pub started_at: DateTime<Utc>,
    /// Last activity in the session
    pub ended_at: Option<DateTime<Utc>>,
    /// Language practiced
    pub language: TargetLanguage,
    /// Level at the session's most recent activity
    pub level: CefrLevel,
    /// Learner messages sent during the session
    pub messages_count: i64,
    /// Vocabulary items captured during the session
    pub words_learned: i64,
}

/// Learning session database operations
pub struct SessionManager {
    pool: SqlitePool,
}

impl SessionManager {
    /// Create a new session manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one unit of chat activity.
    ///
    /// Continues the most recent session for this identity and language if
    /// its last activity falls inside the session window; otherwise opens a
    /// new session. Counters are incremented either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record_activity(
        &self,
        identity: Identity,
        language: TargetLanguage,
        level: CefrLevel,
        words_learned: i64,
    ) -> AppResult<()> {
        let now = Utc::now();
        let window_start = now - Duration::minutes(SESSION_WINDOW_MINUTES);

        let open_session = sqlx::query(
            r"
            SELECT id FROM learning_sessions
            WHERE identity_id = $1 AND language = $2
              AND COALESCE(ended_at, started_at) >= $3
            ORDER BY started_at DESC
            LIMIT 1
            ",
        )
        .bind(identity.id.to_string())
        .bind(language.as_str())
        .bind(window_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find open session: {e}")))?;

        if let Some(row) = open_session {
            let session_id: String = row
                .try_get("id")
                .map_err(|e| AppError::database(format!("Bad session row: {e}")))?;

            sqlx::query(
                r"
                UPDATE learning_sessions
                SET messages_count = messages_count + 1,
                    words_learned = words_learned + $1,
                    ended_at = $2,
                    level = $3
                WHERE id = $4
                ",
            )
            .bind(words_learned)
            .bind(now)
            .bind(level.as_str())
            .bind(&session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update session: {e}")))?;

            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO learning_sessions
                (id, identity_id, started_at, ended_at, language, level, messages_count, words_learned)
            VALUES ($1, $2, $3, $3, $4, $5, 1, $6)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(identity.id.to_string())
        .bind(now)
        .bind(language.as_str())
        .bind(level.as_str())
        .bind(words_learned)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to open session: {e}")))?;

        Ok(())
    }

    /// All sessions for one identity, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_for_identity(
        &self,
        identity_id: Uuid,
    ) -> AppResult<Vec<LearningSessionEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, identity_id, started_at, ended_at, language, level,
                   messages_count, words_learned
            FROM learning_sessions
            WHERE identity_id = $1
            ORDER BY started_at DESC
            ",
        )
        .bind(identity_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list sessions: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Move every session owned by one identity to another.
    ///
    /// Sessions are transferred wholesale; they are never deduplicated.
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn reassign_all(
        &self,
        mode: AccessMode,
        from: Uuid,
        to: Uuid,
    ) -> AppResult<u64> {
        mode.require_elevated("Reassigning session ownership")?;

        let result = sqlx::query("UPDATE learning_sessions SET identity_id = $1 WHERE identity_id = $2")
            .bind(to.to_string())
            .bind(from.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reassign sessions: {e}")))?;

        Ok(result.rows_affected())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> AppResult<LearningSessionEntry> {
    let identity_raw: String = row
        .try_get("identity_id")
        .map_err(|e| AppError::database(format!("Bad session row: {e}")))?;
    let language_raw: String = row
        .try_get("language")
        .map_err(|e| AppError::database(format!("Bad session row: {e}")))?;
    let level_raw: String = row
        .try_get("level")
        .map_err(|e| AppError::database(format!("Bad session row: {e}")))?;

    Ok(LearningSessionEntry {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Bad session row: {e}")))?,
        identity_id: Uuid::parse_str(&identity_raw)
            .map_err(|e| AppError::database(format!("Bad identity id in session row: {e}")))?,
        started_at: row
            .try_get("started_at")
            .map_err(|e| AppError::database(format!("Bad session row: {e}")))?,
        ended_at: row
            .try_get("ended_at")
            .map_err(|e| AppError::database(format!("Bad session row: {e}")))?,
        language: TargetLanguage::from_code(&language_raw)
            .ok_or_else(|| AppError::database("Unknown language code in session row"))?,
        level: CefrLevel::from_tag(&level_raw)
            .ok_or_else(|| AppError::database("Unknown level tag in session row"))?,
        messages_count: row
            .try_get("messages_count")
            .map_err(|e| AppError::database(format!("Bad session row: {e}")))?,
        words_learned: row
            .try_get("words_learned")
            .map_err(|e| AppError::database(format!("Bad session row: {e}")))?,
    })
}
