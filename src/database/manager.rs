use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;
use crate::validation::FieldErrors;

/// Errors from the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid record: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True for Postgres `unique_violation` (23505)
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }
}

/// Connection pool construction and housekeeping
pub struct DatabaseManager;

impl DatabaseManager {
    /// Read `DATABASE_URL` from the environment
    pub fn database_url() -> Result<String, DatabaseError> {
        std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))
    }

    fn connect_options(database_url: &str, config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
        let options = PgConnectOptions::from_str(database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        Ok(options.options([("statement_timeout", format!("{}ms", config.statement_timeout_ms))]))
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
    }

    /// Build the pool and verify one connection can be opened
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(database_url, config)?;
        let pool = Self::pool_options(config).connect_with(options).await?;
        info!("Created database pool for: {}", Self::redact(database_url));
        Ok(pool)
    }

    /// Build the pool without connecting; connections open on first use
    pub fn connect_lazy(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options = Self::connect_options(database_url, config)?;
        Ok(Self::pool_options(config).connect_lazy_with(options))
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Connection string safe for logs: password stripped
    pub fn redact(database_url: &str) -> String {
        match url::Url::parse(database_url) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<unparseable database url>".to_string(),
        }
    }
}
