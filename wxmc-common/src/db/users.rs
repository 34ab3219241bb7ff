//! User account queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{Error, Result};

/// Public user profile (never carries credentials)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored password material for a user
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    /// Argon2 PHC string
    pub password_hash: String,
}

type UserRow = (String, String, String, DateTime<Utc>, DateTime<Utc>);

fn user_from_row(row: UserRow) -> Result<User> {
    let (guid, email, username, created_at, updated_at) = row;
    let id = Uuid::parse_str(&guid)
        .map_err(|e| Error::Internal(format!("Invalid user guid '{}': {}", guid, e)))?;
    Ok(User {
        id,
        email,
        username,
        created_at,
        updated_at,
    })
}

/// Insert a new user. Fails with [`Error::Conflict`] if the email is taken.
pub async fn create_user(
    db: &SqlitePool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> Result<User> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT guid FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await?;
    if exists.is_some() {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        username: username.to_string(),
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, email, username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.username)
    .bind(password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(db)
    .await;

    match result {
        Ok(_) => Ok(user),
        // Lost a race with a concurrent registration for the same email
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(Error::Conflict("Email already registered".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Look up a user and their password material by email
pub async fn find_credentials_by_email(db: &SqlitePool, email: &str) -> Result<Option<Credentials>> {
    let row: Option<(String, String, String, DateTime<Utc>, DateTime<Utc>, String)> =
        sqlx::query_as(
            r#"
            SELECT guid, email, username, created_at, updated_at, password_hash
            FROM users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

    row.map(
        |(guid, email, username, created_at, updated_at, password_hash)| {
            Ok(Credentials {
                user: user_from_row((guid, email, username, created_at, updated_at))?,
                password_hash,
            })
        },
    )
    .transpose()
}

/// Look up a user by id
pub async fn get_user(db: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        "SELECT guid, email, username, created_at, updated_at FROM users WHERE guid = ?",
    )
    .bind(id.to_string())
    .fetch_optional(db)
    .await?;

    row.map(user_from_row).transpose()
}
