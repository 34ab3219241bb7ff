//! Bearer token sessions
//!
//! Rows are keyed by the SHA-256 digest of the token; the token itself is
//! never written to the database.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{Error, Result};

/// Hex SHA-256 of a bearer token, as stored in `sessions.token_digest`
pub fn token_digest(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Store a token for `user_id`, valid for `ttl`. Returns the expiry time.
pub async fn create_session(
    db: &SqlitePool,
    user_id: Uuid,
    token: &str,
    ttl: Duration,
) -> Result<DateTime<Utc>> {
    let now = Utc::now();
    let expires_at = now + ttl;

    sqlx::query(
        "INSERT INTO sessions (token_digest, user_guid, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_digest(token))
    .bind(user_id.to_string())
    .bind(now)
    .bind(expires_at)
    .execute(db)
    .await?;

    Ok(expires_at)
}

/// User owning `token`, or `None` if the token is unknown or expired.
///
/// An expired token's row is removed on lookup.
pub async fn resolve_session(db: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let digest = token_digest(token);
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_guid, expires_at FROM sessions WHERE token_digest = ?")
            .bind(&digest)
            .fetch_optional(db)
            .await?;

    let Some((guid, expires_at)) = row else {
        return Ok(None);
    };

    if expires_at <= Utc::now() {
        sqlx::query("DELETE FROM sessions WHERE token_digest = ?")
            .bind(&digest)
            .execute(db)
            .await?;
        return Ok(None);
    }

    Uuid::parse_str(&guid)
        .map(Some)
        .map_err(|e| Error::Internal(format!("Invalid session user guid '{}': {}", guid, e)))
}

/// Delete every expired session; returns how many were removed
pub async fn purge_expired_sessions(db: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now())
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}
