//! File-backed metadata providers for CLI refresh runs
//!
//! Deployments embed this service next to a host platform that implements
//! the provider traits directly; the CLI instead reads a JSON export of the
//! host's product metadata and serves it through the same traits.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use taxonomy_common::providers::{
    CourseMetadata, CourseMetadataProvider, ProgramMetadata, ProgramMetadataProvider,
    XBlockMetadata, XBlockMetadataProvider,
};
use taxonomy_common::{Error, Result};
use uuid::Uuid;

/// Metadata export file layout
#[derive(Debug, Default, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    courses: Vec<CourseMetadata>,
    #[serde(default)]
    programs: Vec<ProgramMetadata>,
    #[serde(default)]
    xblocks: Vec<XBlockMetadata>,
}

/// Provider backed by a JSON metadata export
pub struct JsonFileProvider {
    data: MetadataFile,
}

impl JsonFileProvider {
    /// Load a metadata export from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let data: MetadataFile = serde_json::from_str(&content)
            .map_err(|e| Error::InvalidInput(format!("Invalid metadata file: {}", e)))?;
        Ok(Self { data })
    }
}

#[async_trait]
impl CourseMetadataProvider for JsonFileProvider {
    async fn get_courses(&self, course_ids: &[Uuid]) -> Result<Vec<CourseMetadata>> {
        Ok(self
            .data
            .courses
            .iter()
            .filter(|c| course_ids.contains(&c.uuid))
            .cloned()
            .collect())
    }

    async fn get_all_courses(&self) -> Result<Vec<CourseMetadata>> {
        Ok(self.data.courses.clone())
    }
}

#[async_trait]
impl ProgramMetadataProvider for JsonFileProvider {
    async fn get_programs(&self, program_ids: &[Uuid]) -> Result<Vec<ProgramMetadata>> {
        Ok(self
            .data
            .programs
            .iter()
            .filter(|p| program_ids.contains(&p.uuid))
            .cloned()
            .collect())
    }

    async fn get_all_programs(&self) -> Result<Vec<ProgramMetadata>> {
        Ok(self.data.programs.clone())
    }
}

#[async_trait]
impl XBlockMetadataProvider for JsonFileProvider {
    async fn get_xblocks(&self, usage_keys: &[String]) -> Result<Vec<XBlockMetadata>> {
        Ok(self
            .data
            .xblocks
            .iter()
            .filter(|x| usage_keys.contains(&x.usage_key))
            .cloned()
            .collect())
    }

    async fn get_all_xblocks(&self) -> Result<Vec<XBlockMetadata>> {
        Ok(self.data.xblocks.clone())
    }
}
