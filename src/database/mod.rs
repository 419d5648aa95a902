// ABOUTME: Database management for checkpoints, record sets, and user accounts
// ABOUTME: Owns the connection pool, schema migration, and the access mode discipline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Database Management
//!
//! This module provides the storage layer for the tutoring server: the
//! conversation checkpoint store, the three per-identity record sets
//! (vocabulary, sessions, lesson completions), user accounts, and the
//! identity-merge audit table.
//!
//! Every manager is a thin wrapper over the shared `SqlitePool`. Mutations
//! that touch rows the caller does not own take an explicit [`AccessMode`]
//! so privilege escalation is visible and testable at the call site; only
//! the identity-merge reconciler runs in elevated mode.

mod checkpoints;
mod lessons;
mod merge;
mod sessions;
mod users;
mod vocabulary;

pub use checkpoints::CheckpointManager;
pub use lessons::{LessonCompletionEntry, LessonCompletionManager};
pub use merge::{IdentityMergeReconciler, MergeReport};
pub use sessions::{LearningSessionEntry, SessionManager};
pub use users::UserManager;
pub use vocabulary::{VocabularyEntry, VocabularyManager};

use crate::errors::{AppError, AppResult};
use sqlx::SqlitePool;

/// Access discipline for record-set mutations.
///
/// `Restricted` callers may only touch rows owned by their own identity.
/// `Elevated` is reserved for the identity-merge reconciler, which moves
/// guest rows it does not own in the normal sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Caller may only mutate rows it owns
    Restricted,
    /// Caller may mutate any identity's rows
    Elevated,
}

impl AccessMode {
    /// Reject the operation unless running elevated
    pub(crate) fn require_elevated(self, action: &str) -> AppResult<()> {
        match self {
            Self::Elevated => Ok(()),
            Self::Restricted => Err(AppError::permission_denied(format!(
                "{action} requires elevated access"
            ))),
        }
    }
}

/// Database handle shared across the server
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a database connection pool and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the pool for manager construction
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checkpoint store for conversation threads
    #[must_use]
    pub fn checkpoints(&self) -> CheckpointManager {
        CheckpointManager::new(self.pool.clone())
    }

    /// Vocabulary record set
    #[must_use]
    pub fn vocabulary(&self) -> VocabularyManager {
        VocabularyManager::new(self.pool.clone())
    }

    /// Learning session record set
    #[must_use]
    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.pool.clone())
    }

    /// Lesson completion record set
    #[must_use]
    pub fn lessons(&self) -> LessonCompletionManager {
        LessonCompletionManager::new(self.pool.clone())
    }

    /// User account storage
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }

    /// Check whether the database answers a trivial query
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot serve the query.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Ping failed: {e}")))?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_checkpoints().await?;
        self.migrate_record_sets().await?;
        self.migrate_users().await?;
        Ok(())
    }

    async fn migrate_checkpoints(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversation_checkpoints (
                thread_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create checkpoint table: {e}")))?;

        Ok(())
    }

    async fn migrate_record_sets(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS vocabulary_entries (
                id TEXT PRIMARY KEY,
                identity_id TEXT NOT NULL,
                word TEXT NOT NULL,
                translation TEXT NOT NULL,
                language TEXT NOT NULL,
                part_of_speech TEXT,
                first_seen_at TEXT NOT NULL,
                times_seen INTEGER NOT NULL DEFAULT 1,
                times_correct INTEGER NOT NULL DEFAULT 0,
                UNIQUE(identity_id, word, language)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create vocabulary table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS learning_sessions (
                id TEXT PRIMARY KEY,
                identity_id TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                language TEXT NOT NULL,
                level TEXT NOT NULL,
                messages_count INTEGER NOT NULL DEFAULT 0,
                words_learned INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create sessions table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS lesson_completions (
                id TEXT PRIMARY KEY,
                identity_id TEXT NOT NULL,
                lesson_id TEXT NOT NULL,
                completed_at TEXT,
                score INTEGER,
                UNIQUE(identity_id, lesson_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create completions table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_vocabulary_identity_language
            ON vocabulary_entries(identity_id, language)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create vocabulary index: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_sessions_identity
            ON learning_sessions(identity_id, started_at)
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create sessions index: {e}")))?;

        Ok(())
    }

    async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS identity_merges (
                guest_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                merged_at TEXT NOT NULL,
                vocabulary_merged INTEGER NOT NULL DEFAULT 0,
                sessions_moved INTEGER NOT NULL DEFAULT 0,
                lessons_merged INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create merge table: {e}")))?;

        Ok(())
    }
}
