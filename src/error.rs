use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration attempted with an email that already has an account.
    #[error("User with this email already exists")]
    EmailTaken,

    /// Login rejected; never says whether the email or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The presented access token failed verification.
    #[error("Invalid access token")]
    InvalidAccessToken,

    /// The presented refresh token failed verification or no longer matches
    /// the session's stored digest.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The session's own expiry has elapsed.
    #[error("Session expired")]
    SessionExpired,

    /// The session named by the token is no longer active.
    #[error("Session is no longer active")]
    SessionInactive,

    /// The account exists but is deactivated.
    #[error("Account is inactive")]
    UserInactive,

    /// A stored password digest failed to parse. Storage corruption, not a
    /// wrong password; must never surface as a login failure.
    #[error("Stored credential is corrupt")]
    CorruptCredential,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }

            AppError::EmailTaken => {
                tracing::debug!("Registration rejected: email already taken");
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Login rejected: invalid credentials");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::InvalidAccessToken => {
                tracing::warn!("Request rejected: invalid access token");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::InvalidRefreshToken => {
                tracing::warn!("Refresh rejected: invalid refresh token");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::SessionExpired => {
                tracing::warn!("Refresh rejected: session expired");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::SessionInactive => {
                tracing::warn!("Request rejected: session inactive");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::UserInactive => {
                tracing::warn!("Request rejected: account inactive");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::CorruptCredential => {
                tracing::error!("Stored password digest failed to parse");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejections_map_to_401() {
        for err in [
            AppError::InvalidCredentials,
            AppError::InvalidAccessToken,
            AppError::InvalidRefreshToken,
            AppError::SessionExpired,
            AppError::SessionInactive,
            AppError::UserInactive,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn email_taken_maps_to_400() {
        let response = AppError::EmailTaken.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_maps_to_422() {
        let response = AppError::Validation("bad field".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn corrupt_credential_hides_detail() {
        let response = AppError::CorruptCredential.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
