//! Skill catalog and product-link upserts used by the refresh tasks

use crate::extractors::ExtractedSkill;
use sqlx::SqlitePool;
use taxonomy_common::Result;
use uuid::Uuid;

/// Insert or update a skill from the extraction API, returning its row id
///
/// Matching is on the external taxonomy id; name and descriptive fields are
/// refreshed on every run.
pub async fn upsert_skill(pool: &SqlitePool, skill: &ExtractedSkill) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO skills (external_id, name, info_url, type_id, description, category, subcategory)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            name = excluded.name,
            info_url = excluded.info_url,
            type_id = excluded.type_id,
            description = excluded.description,
            category = excluded.category,
            subcategory = excluded.subcategory,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&skill.external_id)
    .bind(&skill.name)
    .bind(&skill.info_url)
    .bind(&skill.type_id)
    .bind(&skill.description)
    .bind(&skill.category)
    .bind(&skill.subcategory)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM skills WHERE external_id = ?")
        .bind(&skill.external_id)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

/// Insert an xblock row if missing, returning its row id
pub async fn ensure_xblock(pool: &SqlitePool, usage_key: &str, content_type: &str) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO xblocks (usage_key, content_type)
        VALUES (?, ?)
        ON CONFLICT(usage_key) DO UPDATE SET content_type = excluded.content_type
        "#,
    )
    .bind(usage_key)
    .bind(content_type)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM xblocks WHERE usage_key = ?")
        .bind(usage_key)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

/// Replace the skill links for a course with a fresh extraction result
pub async fn replace_course_skills(
    pool: &SqlitePool,
    course_key: &str,
    skills: &[(i64, f64)],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM course_skills WHERE course_key = ?")
        .bind(course_key)
        .execute(&mut *tx)
        .await?;

    for (skill_id, confidence) in skills {
        sqlx::query(
            r#"
            INSERT INTO course_skills (course_key, skill_id, confidence)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(course_key)
        .bind(skill_id)
        .bind(confidence)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Replace the skill links for a program with a fresh extraction result
pub async fn replace_program_skills(
    pool: &SqlitePool,
    program_uuid: &Uuid,
    skills: &[(i64, f64)],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM program_skills WHERE program_uuid = ?")
        .bind(program_uuid.to_string())
        .execute(&mut *tx)
        .await?;

    for (skill_id, confidence) in skills {
        sqlx::query(
            r#"
            INSERT INTO program_skills (program_uuid, skill_id, confidence)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(program_uuid.to_string())
        .bind(skill_id)
        .bind(confidence)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
