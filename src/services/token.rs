use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::token::{Claims, TokenKind};

/// Why a token failed verification. Distinguished internally so callers can
/// log precisely; the public surface collapses these into one generic
/// invalid-token rejection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not verify under the configured key/algorithm.
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// The token's expiry has elapsed.
    #[error("token has expired")]
    Expired,
    /// The token is valid but of the wrong kind for this operation.
    #[error("unexpected token type")]
    WrongType,
    /// The token could not be decoded at all.
    #[error("token is malformed")]
    Malformed,
}

/// Mints and verifies signed, time-bound tokens.
///
/// Built once at startup from the configured key, algorithm, and per-kind
/// TTLs. Tokens carry the full claim set including the session they are
/// bound to; only refresh tokens are ever tracked server-side, and only as
/// a digest.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Creates a new `TokenIssuer` from the application configuration.
    pub fn new(config: &Config) -> Self {
        Self::build(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            Duration::minutes(config.access_token_expire_minutes),
            Duration::days(config.refresh_token_expire_days),
        )
    }

    fn build(
        secret: &[u8],
        algorithm: Algorithm,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Signs a token of the given kind, bound to the given session.
    ///
    /// The `jti` is freshly random per call and never reused, even for
    /// same-session reissues.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        email: &str,
        session_id: Uuid,
    ) -> Result<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            user_id,
            email: email.to_string(),
            session_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
            token_type: kind,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verifies signature and expiry, decodes the claims, and rejects tokens
    /// of the wrong kind. The default 60s leeway absorbs clock skew between
    /// service instances.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> std::result::Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })?;

        if data.claims.token_type != expected {
            return Err(TokenError::WrongType);
        }

        Ok(data.claims)
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_expires_in(&self) -> i64 {
        self.access_ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::build(
            b"unit-test-secret",
            Algorithm::HS256,
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    #[test]
    fn round_trips_both_kinds() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = issuer.issue(kind, user_id, "a@x.com", session_id).unwrap();
            let claims = issuer.verify(&token, kind).unwrap();
            assert_eq!(claims.user_id, user_id);
            assert_eq!(claims.session_id, session_id);
            assert_eq!(claims.email, "a@x.com");
            assert_eq!(claims.token_type, kind);
        }
    }

    #[test]
    fn jti_is_fresh_per_issue() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let a = issuer
            .issue(TokenKind::Access, user_id, "a@x.com", session_id)
            .unwrap();
        let b = issuer
            .issue(TokenKind::Access, user_id, "a@x.com", session_id)
            .unwrap();

        let claims_a = issuer.verify(&a, TokenKind::Access).unwrap();
        let claims_b = issuer.verify(&b, TokenKind::Access).unwrap();
        assert_ne!(claims_a.jti, claims_b.jti);
    }

    #[test]
    fn rejects_wrong_kind() {
        let issuer = issuer();
        let token = issuer
            .issue(TokenKind::Refresh, Uuid::new_v4(), "a@x.com", Uuid::new_v4())
            .unwrap();

        assert_eq!(
            issuer.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::WrongType
        );
    }

    #[test]
    fn rejects_foreign_signature() {
        let issuer = issuer();
        let other = TokenIssuer::build(
            b"a-different-secret",
            Algorithm::HS256,
            Duration::minutes(30),
            Duration::days(7),
        );

        let token = other
            .issue(TokenKind::Access, Uuid::new_v4(), "a@x.com", Uuid::new_v4())
            .unwrap();

        assert_eq!(
            issuer.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn rejects_expired_token() {
        // TTL far enough in the past to clear the 60s verification leeway.
        let issuer = TokenIssuer::build(
            b"unit-test-secret",
            Algorithm::HS256,
            Duration::minutes(-5),
            Duration::minutes(-5),
        );

        let token = issuer
            .issue(TokenKind::Access, Uuid::new_v4(), "a@x.com", Uuid::new_v4())
            .unwrap();

        assert_eq!(
            issuer.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn rejects_garbage() {
        let issuer = issuer();
        assert_eq!(
            issuer.verify("not-a-token", TokenKind::Access).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn reports_access_ttl_in_seconds() {
        assert_eq!(issuer().access_expires_in(), 30 * 60);
    }
}
