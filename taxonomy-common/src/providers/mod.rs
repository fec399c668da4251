//! Metadata provider traits
//!
//! The host learning platform sources course, program and xblock metadata;
//! the taxonomy services consume it through these traits. Hosts must
//! implement every method for the taxonomy services to work; the
//! [`validate`] module lets a host prove its implementation honors the
//! interface.

pub mod validate;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course metadata as sourced from the host platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMetadata {
    pub uuid: Uuid,
    pub key: String,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
}

impl CourseMetadata {
    /// Text handed to the skills extraction API for this course
    pub fn extraction_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title, self.short_description, self.full_description
        )
    }
}

/// Program metadata as sourced from the host platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramMetadata {
    pub uuid: Uuid,
    pub title: String,
    pub subtitle: String,
    pub overview: String,
}

impl ProgramMetadata {
    /// Text handed to the skills extraction API for this program
    pub fn extraction_text(&self) -> String {
        format!("{} {} {}", self.title, self.subtitle, self.overview)
    }
}

/// XBlock metadata as sourced from the host platform
///
/// `content` includes the text content of all children xblocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XBlockMetadata {
    pub usage_key: String,
    pub content_type: String,
    pub content: String,
}

/// Course metadata provider
#[async_trait]
pub trait CourseMetadataProvider: Send + Sync {
    /// Get the courses matching the given course UUIDs
    async fn get_courses(&self, course_ids: &[Uuid]) -> Result<Vec<CourseMetadata>>;

    /// Get all courses known to the host
    async fn get_all_courses(&self) -> Result<Vec<CourseMetadata>>;
}

/// Program metadata provider
#[async_trait]
pub trait ProgramMetadataProvider: Send + Sync {
    /// Get the programs matching the given program UUIDs
    async fn get_programs(&self, program_ids: &[Uuid]) -> Result<Vec<ProgramMetadata>>;

    /// Get all programs known to the host
    async fn get_all_programs(&self) -> Result<Vec<ProgramMetadata>>;
}

/// XBlock metadata provider
#[async_trait]
pub trait XBlockMetadataProvider: Send + Sync {
    /// Get the xblocks matching the given usage keys
    async fn get_xblocks(&self, usage_keys: &[String]) -> Result<Vec<XBlockMetadata>>;

    /// Get all xblocks known to the host
    async fn get_all_xblocks(&self) -> Result<Vec<XBlockMetadata>>;
}
