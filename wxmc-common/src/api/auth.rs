//! Account registration, password hashing and bearer token issuance
//!
//! # Password storage
//!
//! Argon2id with default parameters and a random per-password salt, stored
//! as a self-describing PHC string (`$argon2id$v=19$m=...`). Verification
//! reads algorithm, parameters and salt back out of that string.
//!
//! # Tokens
//!
//! Opaque 32-byte random values (64 hex chars) handed to the client once.
//! The `sessions` table keeps only their SHA-256 digest, with an expiry.
//! Presented as `Authorization: Bearer <token>`.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Duration;
use rand::RngCore;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::types::{RegisterRequest, TokenResponse};
use crate::db::{self, User};
use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;

/// Fresh bearer token (64 hex chars)
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Argon2id PHC string for `password` with a fresh random salt
///
/// # Examples
///
/// ```
/// use wxmc_common::api::auth::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("correct horse", &hash));
/// assert!(!verify_password("wrong horse", &hash));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check `password` against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Validate registration fields, returning the first problem found
pub fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if !is_valid_email(&normalize_email(&request.email)) {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a valid email address",
            request.email
        )));
    }

    let username_len = request.username.trim().chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username_len) {
        return Err(Error::InvalidInput(format!(
            "username must be {}-{} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Create an account. Fails with [`Error::Conflict`] for a taken email.
pub async fn register(db: &SqlitePool, request: &RegisterRequest) -> Result<User> {
    validate_registration(request)?;

    let hash = hash_password(&request.password)?;

    db::create_user(
        db,
        &normalize_email(&request.email),
        request.username.trim(),
        &hash,
    )
    .await
}

/// Verify credentials and issue a bearer token valid for `ttl`.
///
/// Unknown email and wrong password fail identically.
pub async fn login(
    db: &SqlitePool,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<TokenResponse> {
    let credentials = db::find_credentials_by_email(db, &normalize_email(email))
        .await?
        .filter(|c| verify_password(password, &c.password_hash))
        .ok_or_else(|| Error::Unauthorized("Incorrect email or password".to_string()))?;

    let token = generate_token();
    db::create_session(db, credentials.user.id, &token, ttl).await?;

    Ok(TokenResponse::bearer(token, ttl.num_seconds()))
}

/// User id behind a bearer token
pub async fn authenticate(db: &SqlitePool, token: &str) -> Result<Uuid> {
    db::resolve_session(db, token)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid or expired token".to_string()))
}
