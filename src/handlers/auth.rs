use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::User,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for changing a user's password.
#[derive(Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The account record returned to clients. Never carries the secret.
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

/// The token pair returned by login and refresh.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<auth_service::IssuedTokens> for TokenResponse {
    fn from(tokens: auth_service::IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer",
            expires_in: tokens.expires_in,
        }
    }
}

/// A plain message response.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Extracts the bearer credential from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Trims an optional name field; empty strings collapse to `None`.
fn normalize_name(name: Option<&str>) -> Result<Option<String>> {
    match name.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            validate_name(trimmed)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt for email: {}", payload.email);
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    let first_name = normalize_name(payload.first_name.as_deref())?;
    let last_name = normalize_name(payload.last_name.as_deref())?;

    let user = auth_service::register(
        &state,
        &payload.email,
        &payload.password,
        first_name.as_deref(),
        last_name.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for email: {}", payload.email);
    validate_email(&payload.email)?;

    let tokens = auth_service::login(&state, &payload.email, &payload.password).await?;

    Ok((StatusCode::OK, Json(TokenResponse::from(tokens))).into_response())
}

/// Handles token refresh. The refresh token arrives as a bearer credential.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let refresh_token = bearer_token(&headers).ok_or(AppError::InvalidRefreshToken)?;

    let tokens = auth_service::refresh(&state, refresh_token).await?;

    Ok((StatusCode::OK, Json(TokenResponse::from(tokens))).into_response())
}

/// Handles logout. Invalid or expired tokens are tolerated; the caller
/// always sees success.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let refresh_token = bearer_token(&headers).ok_or(AppError::InvalidRefreshToken)?;

    auth_service::logout(&state, refresh_token).await?;

    let response = MessageResponse {
        message: "Successfully logged out".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the authenticated user's profile.
#[axum::debug_handler]
pub async fn profile(Extension(user): Extension<User>) -> Result<Response> {
    Ok((StatusCode::OK, Json(UserResponse::from(user))).into_response())
}

/// Handles changing a user's password.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    tracing::info!("🔑 Change password for user: {}", user.id);

    validate_password(&payload.new_password)?;

    auth_service::change_password(
        &state,
        user.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    let response = MessageResponse {
        message: "Password changed successfully. Please log in again.".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_or_malformed_authorization() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn names_normalize_to_none_when_blank() {
        assert_eq!(normalize_name(None).unwrap(), None);
        assert_eq!(normalize_name(Some("   ")).unwrap(), None);
        assert_eq!(
            normalize_name(Some("  Ada ")).unwrap(),
            Some("Ada".to_string())
        );
        assert!(normalize_name(Some("Ada123")).is_err());
    }
}
