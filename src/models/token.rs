use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two token variants. A token is only accepted by operations expecting
/// its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The claim set embedded in every signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The account the token was issued to.
    pub user_id: Uuid,
    /// The account email, denormalized for convenience.
    pub email: String,
    /// The session this token is bound to.
    pub session_id: Uuid,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    /// Issued-at as a Unix timestamp.
    pub iat: i64,
    /// Unique token identifier, fresh per issuance.
    pub jti: Uuid,
    /// Type discriminator (`access` | `refresh`).
    pub token_type: TokenKind,
}
