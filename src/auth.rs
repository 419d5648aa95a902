// ABOUTME: JWT-based identity tokens for guests and registered users
// ABOUTME: Handles token generation, validation, and bcrypt password verification
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Habla Hermano

//! # Identity Tokens
//!
//! This module mints and validates the two token flavors the API accepts:
//! guest tokens (session-scoped UUID subject, `guest` claim set) and user
//! tokens (stable account UUID subject). Guest tokens whose identity has
//! been merged into an account are rejected at the route layer via the
//! merge retirement record; this module only handles the cryptography.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::Identity;

/// JWT claims for an identity token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity UUID
    pub sub: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Whether the subject is a guest identity
    #[serde(default)]
    pub guest: bool,
}

/// Token generation and validation
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    user_expiry: Duration,
    guest_expiry: Duration,
}

impl AuthManager {
    /// Create a manager from an HS256 secret and expiry settings
    #[must_use]
    pub fn new(jwt_secret: &str, user_expiry_hours: u64, guest_expiry_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            user_expiry: Duration::hours(i64::try_from(user_expiry_hours).unwrap_or(i64::MAX)),
            guest_expiry: Duration::hours(i64::try_from(guest_expiry_hours).unwrap_or(i64::MAX)),
        }
    }

    /// Mint a token for a fresh guest identity
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn generate_guest_token(&self) -> AppResult<(String, Identity)> {
        let identity = Identity::new_guest();
        let token = self.encode(identity, self.guest_expiry)?;
        Ok((token, identity))
    }

    /// Mint a token for a registered user
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn generate_user_token(&self, user_id: Uuid) -> AppResult<String> {
        self.encode(Identity::user(user_id), self.user_expiry)
    }

    /// Validate a bearer token and resolve its identity
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for
    /// anything else that fails validation.
    pub fn validate_token(&self, token: &str) -> AppResult<Identity> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::auth_expired(),
                _ => AppError::auth_invalid(format!("Invalid token: {e}")),
            }
        })?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a UUID"))?;

        Ok(Identity {
            id,
            is_guest: data.claims.guest,
        })
    }

    fn encode(&self, identity: Identity, expiry: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.id.to_string(),
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
            guest: identity.is_guest,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}

/// Hash a password for storage
///
/// # Errors
///
/// Returns an error if bcrypt fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored hash
///
/// # Errors
///
/// Returns `AuthInvalid` on mismatch or a malformed hash.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<()> {
    let matches = bcrypt::verify(password, password_hash)
        .map_err(|e| AppError::auth_invalid(format!("Password verification failed: {e}")))?;

    if matches {
        Ok(())
    } else {
        Err(AppError::auth_invalid("Invalid email or password"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new("test-secret", 24, 72)
    }

    #[test]
    fn test_guest_token_round_trip() {
        let auth = manager();
        let (token, identity) = auth.generate_guest_token().unwrap();

        let resolved = auth.validate_token(&token).unwrap();
        assert_eq!(resolved.id, identity.id);
        assert!(resolved.is_guest);
    }

    #[test]
    fn test_user_token_round_trip() {
        let auth = manager();
        let user_id = Uuid::new_v4();
        let token = auth.generate_user_token(user_id).unwrap();

        let resolved = auth.validate_token(&token).unwrap();
        assert_eq!(resolved.id, user_id);
        assert!(!resolved.is_guest);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = manager().generate_user_token(Uuid::new_v4()).unwrap();
        let other = AuthManager::new("different-secret", 24, 72);
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(manager().validate_token("not-a-token").is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
    }
}
