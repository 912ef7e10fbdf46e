use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents one logical login, tracked server-side.
///
/// Holds only a digest of the currently-valid refresh token, never the raw
/// token. At most one digest is valid per session; every successful refresh
/// replaces it.
#[derive(Debug, Clone)]
pub struct Session {
    /// The unique identifier for the session.
    pub id: Uuid,
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 digest (hex) of the currently-valid refresh token.
    pub refresh_token_hash: String,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// Whether the session is active. Once false, the session is terminal.
    pub is_active: bool,
}
