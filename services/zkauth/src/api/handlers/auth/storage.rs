//! Database helpers for users and sessions.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum InsertUserOutcome {
    Created(Uuid),
    Conflict,
}

/// Durable user record; salt and verifier never leave the auth handlers.
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) username: String,
    pub(super) salt: Vec<u8>,
    pub(super) verifier: Vec<u8>,
    pub(super) created_at: DateTime<Utc>,
}

/// Session row; `token` is empty until the challenge is verified.
pub(super) struct SessionRecord {
    pub(super) id: Uuid,
    pub(super) user_id: Uuid,
    pub(super) expires_at: DateTime<Utc>,
}

pub(super) async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check username existence")?;
    Ok(row.get(0))
}

/// Insert a user; a unique-violation on `username` becomes a typed conflict so
/// racing registrations surface as 409, not 500.
pub(super) async fn insert_user(
    pool: &PgPool,
    username: &str,
    salt: &[u8],
    verifier: &[u8],
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users (username, salt, verifier)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(salt)
        .bind(verifier)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertUserOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(super) async fn lookup_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, salt, verifier, created_at
        FROM users
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        salt: row.get("salt"),
        verifier: row.get("verifier"),
        created_at: row.get("created_at"),
    }))
}

pub(super) async fn lookup_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, salt, verifier, created_at
        FROM users
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        salt: row.get("salt"),
        verifier: row.get("verifier"),
        created_at: row.get("created_at"),
    }))
}

pub(super) async fn update_user_credentials(
    pool: &PgPool,
    user_id: Uuid,
    salt: &[u8],
    verifier: &[u8],
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET salt = $2, verifier = $3, updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(salt)
        .bind(verifier)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update user credentials")?;
    Ok(result.rows_affected() > 0)
}

/// Create the protocol-scratchpad session row for a started challenge.
///
/// Only the in-memory registry entry is consulted by verify; this row exists
/// so the verified session can later bind its token by id.
pub(super) async fn insert_challenge_session(
    pool: &PgPool,
    user_id: Uuid,
    challenge: &[u8],
    server_secret: &[u8],
    ttl_seconds: i64,
) -> Result<Uuid> {
    let query = r"
        INSERT INTO sessions (user_id, challenge, server_secret, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(challenge)
        .bind(server_secret)
        .bind(ttl_seconds)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert challenge session")?;
    Ok(row.get("id"))
}

/// Bind the issued token to a verified session; false when no row matches.
pub(super) async fn bind_session_token(
    pool: &PgPool,
    session_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool> {
    let query = r"
        UPDATE sessions
        SET token = $2, expires_at = $3
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(session_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to bind session token")?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn lookup_session_by_id(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT id, user_id, expires_at
        FROM sessions
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(session_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session by id")?;

    Ok(row.map(|row| SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
    }))
}

/// Look up an authenticated session by its bearer token, skipping expired rows.
pub(super) async fn lookup_session_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT id, user_id, expires_at
        FROM sessions
        WHERE token = $1 AND token <> '' AND expires_at > NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session by token")?;

    Ok(row.map(|row| SessionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
    }))
}

/// Delete a session by id. Logout is idempotent; missing rows are fine.
pub(super) async fn delete_session(pool: &PgPool, session_id: Uuid) -> Result<()> {
    let query = "DELETE FROM sessions WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(session_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

/// Drop expired session rows; returns how many were removed.
pub(super) async fn delete_expired_sessions(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM sessions WHERE expires_at < NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete expired sessions")?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_user_outcome_debug_names() {
        assert_eq!(
            format!("{:?}", InsertUserOutcome::Created(Uuid::nil())),
            format!("Created({})", Uuid::nil())
        );
        assert_eq!(format!("{:?}", InsertUserOutcome::Conflict), "Conflict");
    }

    #[test]
    fn user_record_holds_values() {
        let record = UserRecord {
            id: Uuid::nil(),
            username: "alice".to_string(),
            salt: vec![1, 2, 3],
            verifier: vec![4, 5, 6],
            created_at: Utc::now(),
        };
        assert_eq!(record.username, "alice");
        assert_eq!(record.salt, vec![1, 2, 3]);
        assert_eq!(record.verifier, vec![4, 5, 6]);
    }
}
