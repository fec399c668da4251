//! Skill extraction
//!
//! The refresh tasks hand product text to a [`SkillExtractor`] and store what
//! comes back. Production uses the HTTP client against the configured skills
//! extraction API; tests substitute a static implementation.

mod skills_client;

pub use skills_client::HttpSkillsClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxonomy_common::Result;

/// A skill inferred from product text by the extraction API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSkill {
    /// Stable id in the external skills taxonomy
    pub external_id: String,
    pub name: String,
    pub info_url: Option<String>,
    pub type_id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Extraction confidence in [0.0, 1.0]
    pub confidence: f64,
}

/// Extracts skills from free text
#[async_trait]
pub trait SkillExtractor: Send + Sync {
    async fn extract_skills(&self, text: &str) -> Result<Vec<ExtractedSkill>>;
}
