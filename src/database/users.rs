// ABOUTME: User account storage with bcrypt password hashes
// ABOUTME: Handles creation, lookup by email or id, and login stamping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// User account database operations
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the email is taken, or a
    /// database error otherwise.
    pub async fn create(&self, email: &str, password_hash: &str) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
            last_login_at: None,
        };

        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, NULL)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                AppError::already_exists(format!("Account for {email}"))
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        Ok(user)
    }

    /// Look up a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at, last_login_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Look up a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at, last_login_at FROM users WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Stamp a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to stamp login: {e}")))?;

        Ok(())
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> AppResult<User> {
    let id_raw: String = row
        .try_get("id")
        .map_err(|e| AppError::database(format!("Bad user row: {e}")))?;

    Ok(User {
        id: Uuid::parse_str(&id_raw)
            .map_err(|e| AppError::database(format!("Bad user id: {e}")))?,
        email: row
            .try_get("email")
            .map_err(|e| AppError::database(format!("Bad user row: {e}")))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| AppError::database(format!("Bad user row: {e}")))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| AppError::database(format!("Bad user row: {e}")))?,
        last_login_at: row
            .try_get("last_login_at")
            .map_err(|e| AppError::database(format!("Bad user row: {e}")))?,
    })
}
