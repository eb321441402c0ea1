//! # Kanban Admin
//!
//! Operator tooling for the PostgreSQL backend of kanban-core: creating the
//! database, applying migrations and checking that a deployment is healthy.
//!
//! Configuration is read from the environment (see `kanban_core::config`).
//!
//! ## Usage
//!
//! ```bash
//! KANBAN_STORAGE=postgres DATABASE_URL=postgresql://... cargo run -p kanban-admin -- migrate
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kanban_core::config::{Config, LogFormat, StorageBackend};
use kanban_core::db::migrations::{
    ensure_database_exists, get_migration_status, known_versions, run_migrations,
};
use kanban_core::db::pool::{close_pool, create_pool, get_pool_stats, health_check};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kanban-admin")]
#[command(version, about = "Database maintenance for kanban-core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database named in DATABASE_URL if it does not exist
    CreateDb,
    /// Apply pending schema migrations
    Migrate {
        /// Create the database first
        #[arg(long)]
        create: bool,
    },
    /// Show applied and pending migrations
    Status,
    /// Verify the database answers and the schema is current
    Check,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kanban_core=info,kanban_admin=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Database commands need a configured Postgres backend
fn require_postgres(config: &Config) -> Result<&str> {
    if config.storage != StorageBackend::Postgres {
        anyhow::bail!(
            "storage backend is {}; set KANBAN_STORAGE=postgres to manage a database",
            config.storage
        );
    }
    Ok(config.database.url.as_str())
}

async fn connect(config: &Config) -> Result<PgPool> {
    create_pool(&config.database)
        .await
        .context("Failed to connect to the database")
}

async fn print_status(pool: &PgPool) -> Result<bool> {
    let status = get_migration_status(pool)
        .await
        .context("Failed to read migration status")?;

    println!("embedded migrations: {}", known_versions().len());
    println!("applied migrations:  {}", status.applied_migrations);
    println!("pending migrations:  {}", status.pending_migrations);
    match status.latest_version {
        Some(version) => println!("latest version:      {}", version),
        None => println!("latest version:      none"),
    }

    Ok(status.is_up_to_date())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::debug!(version = kanban_core::VERSION, "kanban-admin starting");
    let url = require_postgres(&config)?;

    match cli.command {
        Commands::CreateDb => {
            ensure_database_exists(url)
                .await
                .context("Failed to create database")?;
            println!("database ready");
        }
        Commands::Migrate { create } => {
            if create {
                ensure_database_exists(url)
                    .await
                    .context("Failed to create database")?;
            }
            let pool = connect(&config).await?;
            run_migrations(&pool).await.context("Migrations failed")?;
            print_status(&pool).await?;
            close_pool(pool).await;
        }
        Commands::Status => {
            let pool = connect(&config).await?;
            print_status(&pool).await?;
            close_pool(pool).await;
        }
        Commands::Check => {
            let pool = connect(&config).await?;
            health_check(&pool).await.context("Health check failed")?;

            let stats = get_pool_stats(&pool);
            println!(
                "connections: {} total, {} idle, {} active",
                stats.total_connections, stats.idle_connections, stats.active_connections
            );

            let up_to_date = print_status(&pool).await?;
            close_pool(pool).await;

            if !up_to_date {
                anyhow::bail!("schema is behind; run `kanban-admin migrate`");
            }
            println!("ok");
        }
    }

    Ok(())
}
