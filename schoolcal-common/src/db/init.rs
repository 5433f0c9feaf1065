//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. Safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys (required for ON DELETE CASCADE on school_data)
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers while a batch sweep writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema, for tests.
///
/// Limited to a single connection: every pooled connection would otherwise
/// get its own private in-memory database.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Run migrations (idempotent - safe to call multiple times)
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schools_table(pool).await?;
    create_school_data_table(pool).await?;
    Ok(())
}

async fn create_schools_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schools (
            urn                  INTEGER PRIMARY KEY,
            establishment_name   TEXT NOT NULL,
            local_authority      TEXT NOT NULL,
            establishment_status TEXT NOT NULL,
            website              TEXT,
            process              INTEGER NOT NULL DEFAULT 0,
            second_scraper       INTEGER NOT NULL DEFAULT 0,
            third_scraper        INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_schools_local_authority
         ON schools(local_authority)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_schools_establishment_status
         ON schools(establishment_status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_school_data_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS school_data (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            school_urn INTEGER NOT NULL REFERENCES schools(urn) ON DELETE CASCADE,
            data       TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Supports the "most recent record per school" lookup
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_school_data_school_created
         ON school_data(school_urn, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
