// ABOUTME: Checkpoint store persisting conversation state between pipeline invocations
// ABOUTME: Serializes ConversationState as JSON keyed by thread id
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! Conversation checkpoint store. The persisted checkpoint is the
//! authoritative conversation state between invocations; the in-memory
//! `ConversationState` is rebuilt from it for every chat turn.

use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::ConversationState;

/// Checkpoint persistence keyed by thread id
pub struct CheckpointManager {
    pool: SqlitePool,
}

impl CheckpointManager {
    /// Create a new checkpoint manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the checkpointed state for a thread, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored payload cannot be
    /// deserialized.
    pub async fn get(&self, thread_id: &str) -> AppResult<Option<ConversationState>> {
        let row = sqlx::query("SELECT state FROM conversation_checkpoints WHERE thread_id = $1")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read checkpoint: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("state")
            .map_err(|e| AppError::database(format!("Failed to read checkpoint column: {e}")))?;

        let state = serde_json::from_str(&payload)
            .map_err(|e| AppError::serialization(format!("Corrupt checkpoint payload: {e}")))?;

        Ok(Some(state))
    }

    /// Persist the state for a thread, replacing any previous checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn put(&self, thread_id: &str, state: &ConversationState) -> AppResult<()> {
        let payload = serde_json::to_string(state)
            .map_err(|e| AppError::serialization(format!("Failed to serialize state: {e}")))?;
        let now = chrono::Utc::now();

        sqlx::query(
            r"
            INSERT INTO conversation_checkpoints (thread_id, state, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(thread_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at
            ",
        )
        .bind(thread_id)
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to write checkpoint: {e}")))?;

        Ok(())
    }
}
