use deadpool_postgres::Pool;
use crate::config::Config;
use crate::error::Result;
use crate::services::token::TokenIssuer;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The token issuer, built once from the configured key and TTLs.
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        let tokens = TokenIssuer::new(config);
        tracing::info!("✅ Token issuer initialized ({:?})", config.jwt_algorithm);

        Ok(AppState {
            db,
            config: config.clone(),
            tokens,
        })
    }
}
