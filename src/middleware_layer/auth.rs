use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    handlers::auth::bearer_token,
    services::auth as auth_service,
    state::AppState,
};

/// A middleware that requires a valid access token.
///
/// Verifies the bearer credential, confirms the session it names is still
/// active, and loads the account. The authenticated `User` is inserted into
/// the request extensions for handlers downstream.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an `AppError` rendered as 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let access_token = bearer_token(request.headers())
        .ok_or(AppError::InvalidAccessToken)?
        .to_string();

    let user = auth_service::current_user(&state, &access_token).await?;

    tracing::debug!("✅ User authenticated: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
