use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// A helper function to map a `tokio_postgres::Row` to a `Session`.
fn row_to_session(row: &Row) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id").map_err(AppError::Database)?,
        user_id: row.try_get("user_id").map_err(AppError::Database)?,
        refresh_token_hash: row.try_get("refresh_token_hash").map_err(AppError::Database)?,
        expires_at: row.try_get("expires_at").map_err(AppError::Database)?,
        created_at: row.try_get("created_at").map_err(AppError::Database)?,
        is_active: row.try_get("is_active").map_err(AppError::Database)?,
    })
}

/// Inserts a new active session. The session id is pre-generated by the
/// caller so the tokens signed against it and the stored digest land in one
/// statement.
pub async fn create_session(
    pool: &Pool,
    id: Uuid,
    user_id: &Uuid,
    refresh_token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<Session> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO user_sessions (id, user_id, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
            &[&id, user_id, &refresh_token_hash, &expires_at],
        )
        .await?;
    row_to_session(&row)
}

/// Returns the session only if it is active. A missing session and an
/// inactive one are indistinguishable to the caller.
pub async fn get_active(pool: &Pool, session_id: &Uuid) -> Result<Option<Session>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM user_sessions
            WHERE id = $1 AND is_active = true
            "#,
            &[session_id],
        )
        .await?;
    row.map(|r| row_to_session(&r)).transpose()
}

/// Atomically replaces the stored refresh-token digest and expiry, but only
/// while the session is active and still holds `current_hash`. Of two
/// concurrent refresh attempts exactly one matches; the loser gets `None`.
/// An invalidated session never matches, so rotation cannot resurrect it.
pub async fn rotate_refresh_token(
    pool: &Pool,
    session_id: &Uuid,
    current_hash: &str,
    new_hash: &str,
    new_expires_at: DateTime<Utc>,
) -> Result<Option<Session>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE user_sessions
            SET refresh_token_hash = $3, expires_at = $4
            WHERE id = $1 AND is_active = true AND refresh_token_hash = $2
            RETURNING *
            "#,
            &[session_id, &current_hash, &new_hash, &new_expires_at],
        )
        .await?;
    row.map(|r| row_to_session(&r)).transpose()
}

/// Marks a session inactive. Idempotent: returns `false` when the session
/// was already inactive or never existed, which is not an error.
pub async fn invalidate(pool: &Pool, session_id: &Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE user_sessions
            SET is_active = false
            WHERE id = $1 AND is_active = true
            "#,
            &[session_id],
        )
        .await?;
    Ok(updated > 0)
}

/// Marks every active session of a user inactive. Returns the number of
/// sessions invalidated.
pub async fn invalidate_all_for_user(pool: &Pool, user_id: &Uuid) -> Result<u64> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE user_sessions
            SET is_active = false
            WHERE user_id = $1 AND is_active = true
            "#,
            &[user_id],
        )
        .await?;
    Ok(updated)
}

/// Marks expired-but-active sessions inactive. Expiry is already checked
/// lazily at validation time; this sweep is hygiene for rows nobody touches
/// again.
pub async fn cleanup_expired(pool: &Pool) -> Result<u64> {
    let client = pool.get().await?;
    let updated = client
        .execute(
            r#"
            UPDATE user_sessions
            SET is_active = false
            WHERE is_active = true AND expires_at < NOW()
            "#,
            &[],
        )
        .await?;
    Ok(updated)
}
