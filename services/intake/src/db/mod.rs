//! Postgres pool and schema for the site-visit log.
//!
//! Queries are checked at runtime, so building does not need a live database.

mod error;

pub use error::DbError;

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Table holding the site-visit log.
pub const VISITS_TABLE: &str = "site_visits";

/// Connection settings, filled in by [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Directory of `NNNN_name.sql` migrations applied in dev mode.
    pub migrations_dir: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/sitevisit".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            migrations_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to site-visit database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(DbError::Connect)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ready when the database answers and the visit log table exists.
    pub async fn health_check(&self) -> Result<(), DbError> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1::text) IS NOT NULL")
            .bind(VISITS_TABLE)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::Query)?;

        if !exists {
            return Err(DbError::SchemaMissing {
                table: VISITS_TABLE,
            });
        }
        Ok(())
    }

    /// Applies pending migrations from `dir`, then checks the visit log
    /// table is in place.
    pub async fn run_migrations(&self, dir: &Path) -> Result<(), DbError> {
        let migration_err = |source| DbError::Migration {
            dir: dir.display().to_string(),
            source,
        };

        let migrator = Migrator::new(dir).await.map_err(migration_err)?;
        info!(
            migrations_dir = %dir.display(),
            migrations = migrator.iter().count(),
            "Applying site-visit migrations"
        );
        migrator.run(&self.pool).await.map_err(migration_err)?;

        self.health_check().await
    }
}
