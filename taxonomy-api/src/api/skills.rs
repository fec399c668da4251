//! Skill catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taxonomy_common::db::models::Skill;

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for the skill list
#[derive(Debug, Deserialize)]
pub struct SkillsQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Case-insensitive name substring filter
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Paginated skill list response
#[derive(Debug, Serialize)]
pub struct SkillListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub results: Vec<Skill>,
}

/// GET /api/v1/skills
///
/// Returns the skill catalog, paginated, optionally filtered by name.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillsQuery>,
) -> Result<Json<SkillListResponse>, ApiError> {
    let pattern = query
        .search
        .as_deref()
        .map(|s| format!("%{}%", s.trim()))
        .unwrap_or_else(|| "%".to_string());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE name LIKE ?")
        .bind(&pattern)
        .fetch_one(&state.db)
        .await?;

    let p = calculate_pagination(total, query.page);

    let results = sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, external_id, name, info_url, type_id, description, category, subcategory
        FROM skills
        WHERE name LIKE ?
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(PAGE_SIZE)
    .bind(p.offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(SkillListResponse {
        total,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        results,
    }))
}

/// GET /api/v1/skills/:id
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Skill>, ApiError> {
    let skill = sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, external_id, name, info_url, type_id, description, category, subcategory
        FROM skills
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("skill {}", id)))?;

    Ok(Json(skill))
}
