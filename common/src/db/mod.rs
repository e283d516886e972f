//! PostgreSQL connection pool and schema migrations

use std::path::PathBuf;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};
use tracing::info;

use crate::error::{Error, Result};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    info!("Connecting to PostgreSQL database with pool size: {}", max_connections);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL database");
    Ok(pool)
}

/// Directory holding the workspace SQL migrations
pub fn migrations_dir() -> Result<PathBuf> {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|workspace| workspace.join("migrations"))
        .ok_or_else(|| Error::ConfigurationError("Cannot locate workspace migrations directory".to_string()))
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_path = migrations_dir()?;
    info!("Applying migrations from {}", migrations_path.display());

    sqlx::migrate::Migrator::new(migrations_path)
        .await?
        .run(pool)
        .await?;

    Ok(())
}
