// ABOUTME: Vocabulary record set with per-identity word counters
// ABOUTME: Upserts encounters by (identity, word, language) and supports merge primitives
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::database::AccessMode;
use crate::errors::{AppError, AppResult};
use crate::models::{Identity, TargetLanguage, VocabularyItem};

/// One row of the vocabulary record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// Row id
    pub id: String,
    /// Owning identity
    pub identity_id: Uuid,
    /// Word in the target language
    pub word: String,
    /// English translation
    pub translation: String,
    /// Language this word belongs to
    pub language: TargetLanguage,
    /// Part of speech, when known
    pub part_of_speech: Option<String>,
    /// First encounter timestamp
    pub first_seen_at: DateTime<Utc>,
    /// Total encounters, starts at 1
    pub times_seen: i64,
    /// Correct uses, starts at 0
    pub times_correct: i64,
}

/// Vocabulary database operations
pub struct VocabularyManager {
    pool: SqlitePool,
}

impl VocabularyManager {
    /// Create a new vocabulary manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one encounter of a word.
    ///
    /// Creates the entry on first sight (`times_seen = 1`) and increments
    /// the counter on every subsequent encounter of the same
    /// (identity, word, language) key. A missing part of speech is filled
    /// in later if a subsequent encounter supplies one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record_encounter(
        &self,
        identity: Identity,
        language: TargetLanguage,
        item: &VocabularyItem,
    ) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO vocabulary_entries
                (id, identity_id, word, translation, language, part_of_speech, first_seen_at, times_seen, times_correct)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, 0)
            ON CONFLICT(identity_id, word, language) DO UPDATE SET
                times_seen = times_seen + 1,
                part_of_speech = COALESCE(vocabulary_entries.part_of_speech, excluded.part_of_speech)
            ",
        )
        .bind(&id)
        .bind(identity.id.to_string())
        .bind(&item.word)
        .bind(&item.translation)
        .bind(language.as_str())
        .bind(item.part_of_speech.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record vocabulary encounter: {e}")))?;

        Ok(())
    }

    /// Record one correct use of a word, counting it as an encounter too.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record_correct_use(
        &self,
        identity: Identity,
        language: TargetLanguage,
        item: &VocabularyItem,
    ) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO vocabulary_entries
                (id, identity_id, word, translation, language, part_of_speech, first_seen_at, times_seen, times_correct)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, 1)
            ON CONFLICT(identity_id, word, language) DO UPDATE SET
                times_seen = times_seen + 1,
                times_correct = times_correct + 1
            ",
        )
        .bind(&id)
        .bind(identity.id.to_string())
        .bind(&item.word)
        .bind(&item.translation)
        .bind(language.as_str())
        .bind(item.part_of_speech.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record correct use: {e}")))?;

        Ok(())
    }

    /// All entries for one identity, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_for_identity(&self, identity_id: Uuid) -> AppResult<Vec<VocabularyEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, identity_id, word, translation, language, part_of_speech,
                   first_seen_at, times_seen, times_correct
            FROM vocabulary_entries
            WHERE identity_id = $1
            ORDER BY first_seen_at ASC
            ",
        )
        .bind(identity_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list vocabulary: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Entries for one identity and language, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_for_language(
        &self,
        identity_id: Uuid,
        language: TargetLanguage,
    ) -> AppResult<Vec<VocabularyEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, identity_id, word, translation, language, part_of_speech,
                   first_seen_at, times_seen, times_correct
            FROM vocabulary_entries
            WHERE identity_id = $1 AND language = $2
            ORDER BY first_seen_at ASC
            ",
        )
        .bind(identity_id.to_string())
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list vocabulary: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Look up one entry by its natural key
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find(
        &self,
        identity_id: Uuid,
        word: &str,
        language: TargetLanguage,
    ) -> AppResult<Option<VocabularyEntry>> {
        let row = sqlx::query(
            r"
            SELECT id, identity_id, word, translation, language, part_of_speech,
                   first_seen_at, times_seen, times_correct
            FROM vocabulary_entries
            WHERE identity_id = $1 AND word = $2 AND language = $3
            ",
        )
        .bind(identity_id.to_string())
        .bind(word)
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find vocabulary entry: {e}")))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    /// Fold guest counters into an existing entry during a merge.
    ///
    /// Adds to both counters and moves `first_seen_at` back to the earlier
    /// of the two timestamps.
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn absorb_counts(
        &self,
        mode: AccessMode,
        entry_id: &str,
        add_seen: i64,
        add_correct: i64,
        first_seen_at: DateTime<Utc>,
    ) -> AppResult<()> {
        mode.require_elevated("Absorbing vocabulary counters")?;

        sqlx::query(
            r"
            UPDATE vocabulary_entries
            SET times_seen = times_seen + $1,
                times_correct = times_correct + $2,
                first_seen_at = MIN(first_seen_at, $3)
            WHERE id = $4
            ",
        )
        .bind(add_seen)
        .bind(add_correct)
        .bind(first_seen_at)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to absorb counters: {e}")))?;

        Ok(())
    }

    /// Reassign one entry to a different identity, in place
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
        mode.require_elevated("Reassigning vocabulary ownership")?;

        sqlx::query("UPDATE vocabulary_entries SET identity_id = $1 WHERE id = $2")
            .bind(new_owner.to_string())
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to reassign entry: {e}")))?;

        Ok(())
    }

    /// Delete one entry by row id
    ///
    /// # Errors
    ///
    /// Fails in restricted mode or when the database operation fails.
    pub async fn delete_entry(&self, mode: AccessMode, entry_id: &str) -> AppResult<()> {
        mode.require_elevated("Deleting another identity's vocabulary")?;

        sqlx::query("DELETE FROM vocabulary_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete entry: {e}")))?;

        Ok(())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> AppResult<VocabularyEntry> {
    let identity_raw: String = row
        .try_get("identity_id")
        .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?;
    let language_raw: String = row
        .try_get("language")
        .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?;

    Ok(VocabularyEntry {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        identity_id: Uuid::parse_str(&identity_raw)
            .map_err(|e| AppError::database(format!("Bad identity id in vocabulary row: {e}")))?,
        word: row
            .try_get("word")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        translation: row
            .try_get("translation")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        language: TargetLanguage::from_code(&language_raw)
            .ok_or_else(|| AppError::database("Unknown language code in vocabulary row"))?,
        part_of_speech: row
            .try_get("part_of_speech")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        first_seen_at: row
            .try_get("first_seen_at")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        times_seen: row
            .try_get("times_seen")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
        times_correct: row
            .try_get("times_correct")
            .map_err(|e| AppError::database(format!("Bad vocabulary row: {e}")))?,
    })
}
