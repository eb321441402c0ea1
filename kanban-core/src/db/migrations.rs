//! Schema migrations
//!
//! The SQL files in the workspace's `migrations/` directory are embedded at
//! compile time through [`MIGRATOR`]. Applied versions are tracked by sqlx in
//! the `_sqlx_migrations` table.
//!
//! # Example
//!
//! ```no_run
//! use kanban_core::db::migrations::{get_migration_status, run_migrations};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! run_migrations(&pool).await?;
//! let status = get_migration_status(&pool).await?;
//! assert!(status.is_up_to_date());
//! # Ok(())
//! # }
//! ```

use sqlx::migrate::{MigrateDatabase, MigrateError, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, info, warn};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Where the database stands relative to the embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied migrations
    pub applied_migrations: usize,

    /// Embedded migrations not yet applied
    pub pending_migrations: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending_migrations == 0
    }
}

/// Versions of the embedded up-migrations, ascending
pub fn known_versions() -> Vec<i64> {
    let mut versions: Vec<i64> = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect();
    versions.sort_unstable();
    versions
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(known = known_versions().len(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|err| {
        warn!(error = %err, "Migration failed");
        err
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Compares applied versions with the embedded set
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known = known_versions();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success = true ORDER BY version",
        )
        .fetch_all(pool)
        .await?
    } else {
        debug!("Migrations table does not exist yet");
        Vec::new()
    };

    let pending = known.iter().filter(|v| !applied.contains(*v)).count();
    let status = MigrationStatus {
        applied_migrations: applied.len(),
        pending_migrations: pending,
        latest_version: applied.last().copied(),
    };

    debug!(?status, "Migration status retrieved");
    Ok(status)
}

/// Creates the database named in `database_url` if it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Creating database");
    Postgres::create_database(database_url).await?;
    Ok(())
}

/// Drops the database named in `database_url`. All data is lost.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        debug!("Database does not exist, nothing to drop");
        return Ok(());
    }

    warn!("Dropping database");
    Postgres::drop_database(database_url).await?;
    Ok(())
}
