//! XBlock skill tag endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taxonomy_common::db::models::XBlock;

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct XBlocksQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Filter tags on verification state: "true" or "false"
    pub verified: Option<bool>,
}

fn default_page() -> i64 {
    1
}

/// One skill tag on an xblock, with its vote state
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SkillTagDetail {
    #[serde(skip)]
    pub xblock_id: i64,
    pub skill_id: i64,
    pub skill_name: String,
    pub verified_count: i64,
    pub ignored_count: i64,
    pub verified: bool,
    pub is_blacklisted: bool,
}

/// An xblock with its skill tags
#[derive(Debug, Serialize)]
pub struct XBlockDetail {
    #[serde(flatten)]
    pub xblock: XBlock,
    pub skills: Vec<SkillTagDetail>,
}

#[derive(Debug, Serialize)]
pub struct XBlockListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub results: Vec<XBlockDetail>,
}

/// GET /api/v1/xblocks
///
/// Returns xblocks with their skill tags; `verified` filters the tags by
/// verification state (blacklisted tags are always excluded from listings,
/// matching what learners are shown).
pub async fn list_xblocks(
    State(state): State<AppState>,
    Query(query): Query<XBlocksQuery>,
) -> Result<Json<XBlockListResponse>, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM xblocks")
        .fetch_one(&state.db)
        .await?;

    let p = calculate_pagination(total, query.page);

    let xblocks = sqlx::query_as::<_, XBlock>(
        r#"
        SELECT id, usage_key, content_type
        FROM xblocks
        ORDER BY usage_key
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(p.offset)
    .fetch_all(&state.db)
    .await?;

    let mut results = Vec::with_capacity(xblocks.len());
    for xblock in xblocks {
        let skills = fetch_tags(&state, xblock.id, query.verified).await?;
        results.push(XBlockDetail { xblock, skills });
    }

    Ok(Json(XBlockListResponse {
        total,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        results,
    }))
}

/// GET /api/v1/xblocks/:id
pub async fn get_xblock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<XBlockDetail>, ApiError> {
    let xblock = sqlx::query_as::<_, XBlock>(
        "SELECT id, usage_key, content_type FROM xblocks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("xblock {}", id)))?;

    let skills = fetch_tags(&state, xblock.id, None).await?;

    Ok(Json(XBlockDetail { xblock, skills }))
}

/// Fetch an xblock's tags, optionally filtered by verification state
async fn fetch_tags(
    state: &AppState,
    xblock_id: i64,
    verified: Option<bool>,
) -> Result<Vec<SkillTagDetail>, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT d.xblock_id, d.skill_id, s.name AS skill_name,
               d.verified_count, d.ignored_count, d.verified, d.is_blacklisted
        FROM xblock_skill_data d
        JOIN skills s ON s.id = d.skill_id
        WHERE d.xblock_id = ? AND d.is_blacklisted = 0
        "#,
    );
    if verified.is_some() {
        sql.push_str(" AND d.verified = ?");
    }
    sql.push_str(" ORDER BY s.name");

    let mut q = sqlx::query_as::<_, SkillTagDetail>(&sql).bind(xblock_id);
    if let Some(flag) = verified {
        q = q.bind(flag);
    }

    Ok(q.fetch_all(&state.db).await?)
}
