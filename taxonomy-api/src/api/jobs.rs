//! Job and job posting endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taxonomy_common::db::models::{Job, JobPosting};

use crate::api::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub results: Vec<Job>,
}

/// A job's skill with its industry scope
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct JobSkillDetail {
    pub skill_id: i64,
    pub skill_name: String,
    pub industry_code: Option<i64>,
    pub industry_name: Option<String>,
    pub significance: f64,
}

/// Job detail: the job row, its skills and its posting aggregate
#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: Job,
    pub skills: Vec<JobSkillDetail>,
    pub posting: Option<JobPosting>,
}

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<JobListResponse>, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
        .fetch_one(&state.db)
        .await?;

    let p = calculate_pagination(total, query.page);

    let results = sqlx::query_as::<_, Job>(
        r#"
        SELECT id, external_id, name, description
        FROM jobs
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(p.offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(JobListResponse {
        total,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        results,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobDetailResponse>, ApiError> {
    let job = sqlx::query_as::<_, Job>(
        "SELECT id, external_id, name, description FROM jobs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("job {}", id)))?;

    let skills = sqlx::query_as::<_, JobSkillDetail>(
        r#"
        SELECT js.skill_id, s.name AS skill_name,
               i.code AS industry_code, i.name AS industry_name,
               js.significance
        FROM job_skills js
        JOIN skills s ON s.id = js.skill_id
        LEFT JOIN industries i ON i.id = js.industry_id
        WHERE js.job_id = ?
        ORDER BY js.significance DESC
        "#,
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let posting = sqlx::query_as::<_, JobPosting>(
        r#"
        SELECT id, job_id, median_salary, median_posting_duration,
               unique_postings, unique_companies
        FROM job_postings
        WHERE job_id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(JobDetailResponse {
        job,
        skills,
        posting,
    }))
}

#[derive(Debug, Serialize)]
pub struct JobPostingListResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub results: Vec<JobPosting>,
}

/// GET /api/v1/jobpostings
pub async fn list_job_postings(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<JobPostingListResponse>, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_postings")
        .fetch_one(&state.db)
        .await?;

    let p = calculate_pagination(total, query.page);

    let results = sqlx::query_as::<_, JobPosting>(
        r#"
        SELECT id, job_id, median_salary, median_posting_duration,
               unique_postings, unique_companies
        FROM job_postings
        ORDER BY unique_postings DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(p.offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(JobPostingListResponse {
        total,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        results,
    }))
}
