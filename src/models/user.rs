use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Represents a user account.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's email address, stored lowercased.
    pub email: String,
    /// The user's salted password digest. Never the cleartext password.
    pub password_hash: String,
    /// The user's first name.
    pub first_name: Option<String>,
    /// The user's last name.
    pub last_name: Option<String>,
    /// Whether the user is active.
    pub is_active: bool,
    /// Whether the user's email has been verified.
    pub is_verified: bool,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// The timestamp of the user's last successful login.
    pub last_login: Option<DateTime<Utc>>,
}
