use std::env;
use anyhow::{Context, Result};
use jsonwebtoken::Algorithm;
use zeroize::Zeroizing;

/// Development-only signing secret used when JWT_SECRET_KEY is not set.
/// Must never reach production; startup logs a loud warning when in use.
const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

/// The application's configuration.
///
/// Built once at startup and carried inside `AppState`; immutable for the
/// process lifetime.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The host the HTTP server binds to.
    pub host: String,
    /// The port the HTTP server binds to.
    pub port: u16,
    /// The secret key used to sign and verify tokens.
    pub jwt_secret: Zeroizing<String>,
    /// The signing algorithm (HMAC family; the key is a shared secret).
    pub jwt_algorithm: Algorithm,
    /// Access token lifetime in minutes.
    pub access_token_expire_minutes: i64,
    /// Refresh token and session lifetime in days.
    pub refresh_token_expire_days: i64,
    /// The memory cost for Argon2 in MB.
    pub argon2_memory_mb: u32,
    /// The number of iterations for Argon2.
    pub argon2_iterations: u32,
    /// The parallelism factor for Argon2.
    pub argon2_parallelism: u32,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Rate limit placeholder; configuration only, not enforced.
    pub rate_limit_per_minute: u32,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => Zeroizing::new(secret),
            _ => {
                tracing::warn!(
                    "⚠️ JWT_SECRET_KEY not set - using the built-in development secret. \
                     Do NOT run like this in production (generate with: openssl rand -hex 32)"
                );
                Zeroizing::new(DEV_JWT_SECRET.to_string())
            }
        };

        let jwt_algorithm = parse_algorithm(
            &env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
        )?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            host: env::var("AUTH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("AUTH_PORT")
                .unwrap_or_else(|_| "8001".to_string())
                .parse()
                .context("Invalid AUTH_PORT")?,
            jwt_secret,
            jwt_algorithm,
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid ACCESS_TOKEN_EXPIRE_MINUTES")?,
            refresh_token_expire_days: env::var("REFRESH_TOKEN_EXPIRE_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid REFRESH_TOKEN_EXPIRE_DAYS")?,
            argon2_memory_mb: env::var("ARGON2_MEMORY_MB")
                .unwrap_or_else(|_| "19".to_string())
                .parse()
                .context("Invalid ARGON2_MEMORY_MB")?,
            argon2_iterations: env::var("ARGON2_ITERATIONS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Invalid ARGON2_ITERATIONS")?,
            argon2_parallelism: env::var("ARGON2_PARALLELISM")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .context("Invalid ARGON2_PARALLELISM")?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_PER_MINUTE")?,
        })
    }

    /// Returns true when the process is running on the built-in development
    /// secret rather than an operator-supplied one.
    pub fn using_dev_secret(&self) -> bool {
        self.jwt_secret.as_str() == DEV_JWT_SECRET
    }
}

/// Parses a JWT algorithm name. Only the HMAC family is supported because
/// the signing key is a shared secret, not a keypair.
fn parse_algorithm(name: &str) -> Result<Algorithm> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => anyhow::bail!("Unsupported JWT_ALGORITHM: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hmac_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
    }

    #[test]
    fn rejects_asymmetric_algorithms() {
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }
}
