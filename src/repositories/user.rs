use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;
use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(AppError::Database)?,
        email: row.try_get("email").map_err(AppError::Database)?,
        password_hash: row.try_get("password_hash").map_err(AppError::Database)?,
        first_name: row.try_get("first_name").map_err(AppError::Database)?,
        last_name: row.try_get("last_name").map_err(AppError::Database)?,
        is_active: row.try_get("is_active").map_err(AppError::Database)?,
        is_verified: row.try_get("is_verified").map_err(AppError::Database)?,
        created_at: row.try_get("created_at").map_err(AppError::Database)?,
        updated_at: row.try_get("updated_at").map_err(AppError::Database)?,
        last_login: row.try_get("last_login").map_err(AppError::Database)?,
    })
}

/// Creates a new user in the database.
///
/// The unique index on `email` backs the one-account-per-email invariant; a
/// duplicate-key race that slips past the caller's pre-check is translated
/// to `EmailTaken`.
pub async fn create_user(
    pool: &Pool,
    id: Uuid,
    email: &str,
    password_hash: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<User> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
            &[&id, &email, &password_hash, &first_name, &last_name],
        )
        .await
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                AppError::EmailTaken
            } else {
                AppError::Database(e)
            }
        })?;
    row_to_user(&row)
}

/// Finds a user by their email address. The caller passes the normalized
/// (lowercased) form; active and inactive accounts both match so that the
/// caller can collapse the two cases into one rejection.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM users
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Stamps the user's last successful login.
pub async fn update_last_login(pool: &Pool, user_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET last_login = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
            &[user_id],
        )
        .await?;
    Ok(())
}

/// Replaces a user's password digest.
pub async fn update_password(
    pool: &Pool,
    user_id: &Uuid,
    password_hash: &str,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
            &[&password_hash, user_id],
        )
        .await?;
    Ok(())
}
