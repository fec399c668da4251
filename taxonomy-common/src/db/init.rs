//! Database initialization
//!
//! Creates the database on first run, applies the schema idempotently and
//! seeds default settings. Safe to call from every service at startup.

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

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows the API's readers to coexist with the verifier's writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_settings_table(&pool).await?;
    create_skills_table(&pool).await?;
    create_jobs_table(&pool).await?;
    create_industries_table(&pool).await?;
    create_job_skills_table(&pool).await?;
    create_job_postings_table(&pool).await?;
    create_course_skills_table(&pool).await?;
    create_program_skills_table(&pool).await?;
    create_xblocks_table(&pool).await?;
    create_xblock_skill_data_table(&pool).await?;
    create_verification_schedules_table(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_skills_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            info_url TEXT,
            type_id TEXT,
            description TEXT NOT NULL DEFAULT '',
            category TEXT,
            subcategory TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_jobs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_industries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS industries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_job_skills_table(pool: &SqlitePool) -> Result<()> {
    // NULL industry_id indicates non-industry specific data
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_skills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            industry_id INTEGER REFERENCES industries(id) ON DELETE CASCADE,
            significance REAL NOT NULL DEFAULT 0.0,
            UNIQUE(job_id, skill_id, industry_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_job_postings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_postings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id INTEGER NOT NULL UNIQUE REFERENCES jobs(id) ON DELETE CASCADE,
            median_salary REAL,
            median_posting_duration INTEGER,
            unique_postings INTEGER NOT NULL DEFAULT 0,
            unique_companies INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_course_skills_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_skills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_key TEXT NOT NULL,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            confidence REAL NOT NULL DEFAULT 0.0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(course_key, skill_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_program_skills_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS program_skills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_uuid TEXT NOT NULL,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            confidence REAL NOT NULL DEFAULT 0.0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(program_uuid, skill_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_xblocks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS xblocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            usage_key TEXT NOT NULL UNIQUE,
            content_type TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the xblock skill tag vote-record table
///
/// Invariant: at most one of `verified` / `is_blacklisted` is true. Decided
/// records are terminal and excluded from further verification passes.
async fn create_xblock_skill_data_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS xblock_skill_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            xblock_id INTEGER NOT NULL REFERENCES xblocks(id) ON DELETE CASCADE,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            verified_count INTEGER NOT NULL DEFAULT 0,
            ignored_count INTEGER NOT NULL DEFAULT 0,
            verified INTEGER NOT NULL DEFAULT 0,
            is_blacklisted INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(xblock_id, skill_id),
            CHECK (NOT (verified = 1 AND is_blacklisted = 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_xblock_skill_data_pending
        ON xblock_skill_data(verified, is_blacklisted)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_verification_schedules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verification_schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            interval_minutes INTEGER NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values. NULL values are
/// reset to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Verification thresholds
    ensure_setting(pool, "verification_min_votes", "2").await?;
    ensure_setting(pool, "verification_ratio_threshold", "0.5").await?;
    ensure_setting(pool, "verification_blacklist_ratio_threshold", "0.9").await?;

    // Skills extraction API (empty = not configured, refresh tasks will fail
    // with a configuration error until the host sets these)
    ensure_setting(pool, "skills_api_url", "").await?;
    ensure_setting(pool, "skills_api_token", "").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Insert a setting if missing, and reset NULL values to the default
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?;

    sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
