use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to connect to site-visit database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("migrations in {dir} failed: {source}")]
    Migration {
        dir: String,
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// Connected, but the schema has not been migrated.
    #[error("table {table} does not exist; run migrations")]
    SchemaMissing { table: &'static str },
}
