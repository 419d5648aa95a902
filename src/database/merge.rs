// ABOUTME: Identity merge reconciler folding a guest's record sets into a user account
// ABOUTME: Deduplicates by natural key, reconciles counters, and retires the guest identity
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Identity Merge Reconciler
//!
//! Runs once, at the moment a guest authenticates. Guest rows only ever
//! move forward into the user's rows, never backward. The whole procedure
//! is best-effort: callers log failures and let authentication succeed
//! regardless; the retirement record is only written after a fully
//! successful pass, so a failed merge leaves the guest's data (and token)
//! intact for a retry on the next login.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::database::{AccessMode, Database};
use crate::errors::{AppError, AppResult};

/// Per-record-set counts from one merge pass, for observability only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Guest vocabulary entries merged or reassigned
    pub vocabulary_merged: u64,
    /// Guest sessions reassigned
    pub sessions_moved: u64,
    /// Guest lesson completions merged or reassigned
    pub lessons_merged: u64,
}

/// Merges a guest identity's record sets into an authenticated user's
pub struct IdentityMergeReconciler {
    db: Database,
}

impl IdentityMergeReconciler {
    /// Create a reconciler over the shared database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Merge every guest record set into the user's and retire the guest.
    ///
    /// Invoking this again after the guest's data is gone is a no-op that
    /// returns all-zero counts.
    ///
    /// # Errors
    ///
    /// Returns an error when any record-set operation fails; in that case
    /// no retirement record is written and the merge can be retried.
    pub async fn merge_guest_into_user(
        &self,
        guest_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<MergeReport> {
        // The guest's rows are not owned by the authenticating principal,
        // so every mutation below runs elevated.
        const MODE: AccessMode = AccessMode::Elevated;

        let mut report = MergeReport::default();

        // Vocabulary: combine counters on key collision, move otherwise.
        let vocabulary = self.db.vocabulary();
        for guest_entry in vocabulary.list_for_identity(guest_id).await? {
            match vocabulary
                .find(user_id, &guest_entry.word, guest_entry.language)
                .await?
            {
                Some(user_entry) => {
                    vocabulary
                        .absorb_counts(
                            MODE,
                            &user_entry.id,
                            guest_entry.times_seen,
                            guest_entry.times_correct,
                            guest_entry.first_seen_at,
                        )
                        .await?;
                    vocabulary.delete_entry(MODE, &guest_entry.id).await?;
                }
                None => {
                    vocabulary
                        .reassign_owner(MODE, &guest_entry.id, user_id)
                        .await?;
                }
            }
            report.vocabulary_merged += 1;
        }

        // Sessions: transferred wholesale, never deduplicated.
        report.sessions_moved = self
            .db
            .sessions()
            .reassign_all(MODE, guest_id, user_id)
            .await?;

        // Lesson completions: higher score wins, missing scores compare as 0.
        let lessons = self.db.lessons();
        for guest_entry in lessons.list_for_identity(guest_id).await? {
            match lessons.find(user_id, &guest_entry.lesson_id).await? {
                Some(user_entry) => {
                    if guest_entry.score.unwrap_or(0) > user_entry.score.unwrap_or(0) {
                        lessons
                            .overwrite_score(MODE, &user_entry.id, guest_entry.score)
                            .await?;
                    }
                    lessons.delete_entry(MODE, &guest_entry.id).await?;
                }
                None => {
                    lessons
                        .reassign_owner(MODE, &guest_entry.id, user_id)
                        .await?;
                }
            }
            report.lessons_merged += 1;
        }

        self.record_merge(guest_id, user_id, report).await?;

        info!(
            guest_id = %guest_id,
            user_id = %user_id,
            vocabulary = report.vocabulary_merged,
            sessions = report.sessions_moved,
            lessons = report.lessons_merged,
            "Merged guest identity into user account"
        );

        Ok(report)
    }

    /// Whether a guest identity has already been merged away.
    ///
    /// Tokens for retired guests are rejected at authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn is_guest_retired(&self, guest_id: Uuid) -> AppResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM identity_merges WHERE guest_id = $1")
            .bind(guest_id.to_string())
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to check merge record: {e}")))?;

        let count: i64 = row
            .try_get("n")
            .map_err(|e| AppError::database(format!("Bad merge count row: {e}")))?;

        Ok(count > 0)
    }

    async fn record_merge(
        &self,
        guest_id: Uuid,
        user_id: Uuid,
        report: MergeReport,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT OR REPLACE INTO identity_merges
                (guest_id, user_id, merged_at, vocabulary_merged, sessions_moved, lessons_merged)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(guest_id.to_string())
        .bind(user_id.to_string())
        .bind(Utc::now())
        .bind(i64::try_from(report.vocabulary_merged).unwrap_or(i64::MAX))
        .bind(i64::try_from(report.sessions_moved).unwrap_or(i64::MAX))
        .bind(i64::try_from(report.lessons_merged).unwrap_or(i64::MAX))
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to record merge: {e}")))?;

        Ok(())
    }
}
