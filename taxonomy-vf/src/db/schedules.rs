//! Verification schedule queries

use sqlx::SqlitePool;
use taxonomy_common::db::models::VerificationSchedule;
use taxonomy_common::Result;

/// Fetch the active schedule, if any
///
/// When several schedules are enabled the earliest-created one wins.
pub async fn get_enabled_schedule(pool: &SqlitePool) -> Result<Option<VerificationSchedule>> {
    let schedule = sqlx::query_as::<_, VerificationSchedule>(
        r#"
        SELECT id, name, interval_minutes, enabled
        FROM verification_schedules
        WHERE enabled = 1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(schedule)
}

/// Create or update a schedule by name and return the stored row
pub async fn upsert_schedule(
    pool: &SqlitePool,
    name: &str,
    interval_minutes: i64,
    enabled: bool,
) -> Result<VerificationSchedule> {
    sqlx::query(
        r#"
        INSERT INTO verification_schedules (name, interval_minutes, enabled)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            interval_minutes = excluded.interval_minutes,
            enabled = excluded.enabled,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(name)
    .bind(interval_minutes)
    .bind(enabled)
    .execute(pool)
    .await?;

    let schedule = sqlx::query_as::<_, VerificationSchedule>(
        r#"
        SELECT id, name, interval_minutes, enabled
        FROM verification_schedules
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(schedule)
}
