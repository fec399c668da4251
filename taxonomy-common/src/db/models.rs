//! Database models

use serde::{Deserialize, Serialize};

/// A skill from the external skills taxonomy
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Skill {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub info_url: Option<String>,
    pub type_id: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Industry {
    pub id: i64,
    pub code: i64,
    pub name: String,
}

/// Skill associated with a job, optionally scoped to an industry
///
/// A NULL industry indicates non-industry specific data.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobSkill {
    pub id: i64,
    pub job_id: i64,
    pub skill_id: i64,
    pub industry_id: Option<i64>,
    pub significance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobPosting {
    pub id: i64,
    pub job_id: i64,
    pub median_salary: Option<f64>,
    pub median_posting_duration: Option<i64>,
    pub unique_postings: i64,
    pub unique_companies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct XBlock {
    pub id: i64,
    pub usage_key: String,
    pub content_type: String,
}

/// Vote record for a skill tag on an xblock
///
/// Created with zero counts when a tag is first inferred; vote counters are
/// incremented by the host platform; the verification engine transitions
/// `verified` / `is_blacklisted`. At most one of the two flags is ever set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct XBlockSkillRecord {
    pub id: i64,
    pub xblock_id: i64,
    pub skill_id: i64,
    pub verified_count: i64,
    pub ignored_count: i64,
    pub verified: bool,
    pub is_blacklisted: bool,
}

impl XBlockSkillRecord {
    /// Whether this record is still awaiting a verification decision
    pub fn is_pending(&self) -> bool {
        !self.verified && !self.is_blacklisted
    }

    /// Total number of votes cast on this tag
    pub fn total_votes(&self) -> i64 {
        self.verified_count + self.ignored_count
    }
}

/// Periodic verification schedule
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationSchedule {
    pub id: i64,
    pub name: String,
    pub interval_minutes: i64,
    pub enabled: bool,
}
