//! Skill tag vote-record queries

use sqlx::SqlitePool;
use taxonomy_common::Result;

/// A pending vote record joined with its display context
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingSkillTag {
    pub id: i64,
    pub usage_key: String,
    pub skill_name: String,
    pub verified_count: i64,
    pub ignored_count: i64,
}

/// Fetch all records still awaiting a decision
///
/// Decided records (verified or blacklisted) are excluded, which is what
/// makes repeated passes idempotent.
pub async fn fetch_pending(pool: &SqlitePool) -> Result<Vec<PendingSkillTag>> {
    let tags = sqlx::query_as::<_, PendingSkillTag>(
        r#"
        SELECT d.id, x.usage_key, s.name AS skill_name,
               d.verified_count, d.ignored_count
        FROM xblock_skill_data d
        JOIN xblocks x ON x.id = d.xblock_id
        JOIN skills s ON s.id = d.skill_id
        WHERE d.verified = 0 AND d.is_blacklisted = 0
        ORDER BY d.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// Mark a tag verified, guarded on the observed vote counts
///
/// Returns `false` when the record was already decided or its counts moved
/// since the read; the caller leaves it for the next pass.
pub async fn mark_verified(pool: &SqlitePool, tag: &PendingSkillTag) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE xblock_skill_data
        SET verified = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND verified = 0 AND is_blacklisted = 0
          AND verified_count = ? AND ignored_count = ?
        "#,
    )
    .bind(tag.id)
    .bind(tag.verified_count)
    .bind(tag.ignored_count)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Mark a tag blacklisted, guarded on the observed vote counts
pub async fn mark_blacklisted(pool: &SqlitePool, tag: &PendingSkillTag) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE xblock_skill_data
        SET is_blacklisted = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND verified = 0 AND is_blacklisted = 0
          AND verified_count = ? AND ignored_count = ?
        "#,
    )
    .bind(tag.id)
    .bind(tag.verified_count)
    .bind(tag.ignored_count)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Create a pending vote record for a newly inferred tag
///
/// Existing records keep their vote counts and decision state.
pub async fn create_pending(pool: &SqlitePool, xblock_id: i64, skill_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO xblock_skill_data (xblock_id, skill_id)
        VALUES (?, ?)
        "#,
    )
    .bind(xblock_id)
    .bind(skill_id)
    .execute(pool)
    .await?;

    Ok(())
}
