use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::token::TokenKind;
use crate::models::user::User;
use crate::repositories::session as session_repo;
use crate::repositories::user as user_repo;
use crate::state::AppState;

/// A freshly issued access/refresh pair, bound to one session.
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Hashes a password using Argon2id.
///
/// Salt is fresh OS randomness per call; cost parameters come from the
/// configuration. Output is not deterministic - verification is
/// comparison-based, not equality-of-digest.
fn hash_password(config: &Config, password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(config.argon2_memory_mb * 1024)
            .t_cost(config.argon2_iterations)
            .p_cost(config.argon2_parallelism)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a stored digest.
///
/// An unparsable digest is storage corruption, reported as such - it must
/// never be folded into "wrong password", or corruption would look like a
/// credential users can brute-force against.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        tracing::error!("Failed to parse stored password digest: {}", e);
        AppError::CorruptCredential
    })?;

    let result = match Argon2::default().verify_password(&password_bytes, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!("Password verification failed structurally: {}", e);
            Err(AppError::CorruptCredential)
        }
    };

    password_bytes.zeroize();
    result
}

/// SHA-256 digest (hex) of a refresh token, the only form ever persisted.
fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Constant-time comparison of two refresh-token digests.
fn refresh_hash_matches(presented: &str, stored: &str) -> bool {
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Lowercased, trimmed form under which emails are stored and looked up.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a new account.
///
/// Uniqueness is pre-checked, and the storage layer's unique index catches
/// the duplicate-key race behind it; the repository reports both as
/// `EmailTaken`.
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<User> {
    let email = normalize_email(email);

    if user_repo::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(&state.config, password)?;

    let user = user_repo::create_user(
        &state.db,
        Uuid::new_v4(),
        &email,
        &password_hash,
        first_name,
        last_name,
    )
    .await?;

    tracing::info!("✅ User registered: {}", user.id);
    Ok(user)
}

/// Authenticates a user and opens a new session.
///
/// Absent account, inactive account, and wrong password are all the same
/// `InvalidCredentials` to the caller. The session id is pre-generated so
/// both tokens are signed against it and the session row lands in a single
/// insert.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<IssuedTokens> {
    let email = normalize_email(email);

    let user = match user_repo::find_by_email(&state.db, &email).await? {
        Some(user) if user.is_active => user,
        _ => return Err(AppError::InvalidCredentials),
    };

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let session_id = Uuid::new_v4();
    let access_token = state
        .tokens
        .issue(TokenKind::Access, user.id, &user.email, session_id)?;
    let refresh_token = state
        .tokens
        .issue(TokenKind::Refresh, user.id, &user.email, session_id)?;

    let expires_at = Utc::now() + Duration::days(state.config.refresh_token_expire_days);
    session_repo::create_session(
        &state.db,
        session_id,
        &user.id,
        &hash_refresh_token(&refresh_token),
        expires_at,
    )
    .await?;

    user_repo::update_last_login(&state.db, &user.id).await?;

    tracing::info!("✅ User logged in: {} (session {})", user.id, session_id);

    Ok(IssuedTokens {
        access_token,
        refresh_token,
        expires_in: state.tokens.access_expires_in(),
    })
}

/// Exchanges a refresh token for a new pair, rotating the session's stored
/// digest.
///
/// Rotation is a compare-and-swap on the presented digest, so of two
/// concurrent refreshes on the same session exactly one rotates; the loser
/// sees the winner's state and is rejected.
pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<IssuedTokens> {
    let claims = state
        .tokens
        .verify(refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            tracing::debug!("Refresh token rejected: {}", e);
            AppError::InvalidRefreshToken
        })?;

    let session = session_repo::get_active(&state.db, &claims.session_id)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;

    let presented_hash = hash_refresh_token(refresh_token);
    if !refresh_hash_matches(&presented_hash, &session.refresh_token_hash) {
        return Err(AppError::InvalidRefreshToken);
    }

    if Utc::now() > session.expires_at {
        session_repo::invalidate(&state.db, &session.id).await?;
        return Err(AppError::SessionExpired);
    }

    let user = match user_repo::find_by_id(&state.db, &session.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(AppError::UserInactive),
    };

    let access_token = state
        .tokens
        .issue(TokenKind::Access, user.id, &user.email, session.id)?;
    let new_refresh_token = state
        .tokens
        .issue(TokenKind::Refresh, user.id, &user.email, session.id)?;

    let new_expires_at = Utc::now() + Duration::days(state.config.refresh_token_expire_days);
    session_repo::rotate_refresh_token(
        &state.db,
        &session.id,
        &presented_hash,
        &hash_refresh_token(&new_refresh_token),
        new_expires_at,
    )
    .await?
    .ok_or(AppError::InvalidRefreshToken)?;

    tracing::info!("🔄 Tokens refreshed for user: {} (session {})", user.id, session.id);

    Ok(IssuedTokens {
        access_token,
        refresh_token: new_refresh_token,
        expires_in: state.tokens.access_expires_in(),
    })
}

/// Resolves an access token to its account, for authorizing protected calls.
///
/// Purely cryptographic validation plus a liveness check against the named
/// session; access tokens are never persisted.
pub async fn current_user(state: &AppState, access_token: &str) -> Result<User> {
    let claims = state
        .tokens
        .verify(access_token, TokenKind::Access)
        .map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            AppError::InvalidAccessToken
        })?;

    session_repo::get_active(&state.db, &claims.session_id)
        .await?
        .ok_or(AppError::SessionInactive)?;

    match user_repo::find_by_id(&state.db, &claims.user_id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::UserInactive),
    }
}

/// Invalidates the session named by a refresh token.
///
/// Always succeeds from the caller's perspective: an invalid or expired
/// token is swallowed. The presented digest is deliberately NOT compared to
/// the stored one - possession of any refresh token ever issued for a
/// session is enough to kill it, so logout with a stale token still lands.
pub async fn logout(state: &AppState, refresh_token: &str) -> Result<()> {
    match state.tokens.verify(refresh_token, TokenKind::Refresh) {
        Ok(claims) => {
            let invalidated = session_repo::invalidate(&state.db, &claims.session_id).await?;
            if invalidated {
                tracing::info!("👋 Session invalidated: {}", claims.session_id);
            }
        }
        Err(e) => {
            tracing::debug!("Logout with unverifiable token ignored: {}", e);
        }
    }
    Ok(())
}

/// Changes a user's password and logs the account out everywhere, so refresh
/// tokens minted under the old password die with it.
pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    let user = user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::UserInactive)?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = hash_password(&state.config, new_password)?;
    user_repo::update_password(&state.db, &user_id, &new_hash).await?;

    let invalidated = session_repo::invalidate_all_for_user(&state.db, &user_id).await?;
    tracing::info!(
        "🔑 Password changed for user: {} ({} sessions invalidated)",
        user_id,
        invalidated
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;
    use zeroize::Zeroizing;

    fn test_config() -> Config {
        Config {
            database_url: "postgresql://localhost/unused".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8001,
            jwt_secret: Zeroizing::new("unit-test-secret".to_string()),
            jwt_algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            // Low cost so the test suite stays fast; production values come
            // from the environment.
            argon2_memory_mb: 8,
            argon2_iterations: 1,
            argon2_parallelism: 1,
            cors_origins: vec![],
            rate_limit_per_minute: 60,
        }
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let config = test_config();
        let hash = hash_password(&config, "Abcdef1!").unwrap();
        assert!(verify_password("Abcdef1!", &hash).unwrap());
    }

    #[test]
    fn wrong_password_fails_verification() {
        let config = test_config();
        let hash = hash_password(&config, "Abcdef1!").unwrap();
        assert!(!verify_password("Abcdef2!", &hash).unwrap());
    }

    #[test]
    fn hashing_is_salted() {
        let config = test_config();
        let first = hash_password(&config, "Abcdef1!").unwrap();
        let second = hash_password(&config, "Abcdef1!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn corrupt_digest_is_not_a_wrong_password() {
        let result = verify_password("Abcdef1!", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::CorruptCredential)));
    }

    #[test]
    fn refresh_digest_is_stable_hex() {
        let digest = hash_refresh_token("some-token");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_refresh_token("some-token"));
        assert_ne!(digest, hash_refresh_token("other-token"));
    }

    #[test]
    fn digest_comparison_detects_mismatch() {
        let a = hash_refresh_token("token-a");
        let b = hash_refresh_token("token-b");
        assert!(refresh_hash_matches(&a, &a.clone()));
        assert!(!refresh_hash_matches(&a, &b));
    }

    #[test]
    fn emails_normalize_to_lowercase() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
