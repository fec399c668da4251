//! Product skill refresh tasks
//!
//! Pulls product metadata from the host's providers, runs it through the
//! skills extractor, and rewrites the product's skill links. A failure on one
//! product is logged and the rest of the batch continues.

use crate::db::{catalog, skill_tags};
use crate::extractors::{ExtractedSkill, SkillExtractor};
use sqlx::SqlitePool;
use taxonomy_common::events::{EventBus, ProductType, TaxonomyEvent};
use taxonomy_common::providers::{
    CourseMetadataProvider, ProgramMetadataProvider, XBlockMetadataProvider,
};
use taxonomy_common::Result;
use tracing::{info, warn};
use uuid::Uuid;

/// Refresh skill tags for the given courses
///
/// Returns the number of courses whose tags were rewritten.
pub async fn refresh_course_skills(
    pool: &SqlitePool,
    provider: &dyn CourseMetadataProvider,
    extractor: &dyn SkillExtractor,
    course_ids: &[Uuid],
    bus: &EventBus,
) -> Result<usize> {
    info!("refresh_course_skills task triggered");

    let courses = provider.get_courses(course_ids).await?;
    if courses.is_empty() {
        warn!("No course found with uuids {:?} to update skills", course_ids);
        return Ok(0);
    }

    let mut refreshed = 0;
    for course in &courses {
        let skills = match extractor.extract_skills(&course.extraction_text()).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!("Skill extraction failed for course [{}]: {}", course.key, e);
                continue;
            }
        };

        let links = match store_skills(pool, &skills).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Failed to store skills for course [{}]: {}", course.key, e);
                continue;
            }
        };

        if let Err(e) = catalog::replace_course_skills(pool, &course.key, &links).await {
            warn!("Failed to link skills for course [{}]: {}", course.key, e);
            continue;
        }

        info!("Updated {} skill tags for course [{}]", links.len(), course.key);
        bus.emit(TaxonomyEvent::SkillsRefreshed {
            product_type: ProductType::Course,
            product_key: course.key.clone(),
            skill_count: links.len(),
            timestamp: chrono::Utc::now(),
        })
        .ok();
        refreshed += 1;
    }

    Ok(refreshed)
}

/// Refresh skill tags for the given programs
pub async fn refresh_program_skills(
    pool: &SqlitePool,
    provider: &dyn ProgramMetadataProvider,
    extractor: &dyn SkillExtractor,
    program_ids: &[Uuid],
    bus: &EventBus,
) -> Result<usize> {
    info!("refresh_program_skills task triggered");

    let programs = provider.get_programs(program_ids).await?;
    if programs.is_empty() {
        warn!("No program found with uuids {:?} to update skills", program_ids);
        return Ok(0);
    }

    let mut refreshed = 0;
    for program in &programs {
        let skills = match extractor.extract_skills(&program.extraction_text()).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!("Skill extraction failed for program [{}]: {}", program.uuid, e);
                continue;
            }
        };

        let links = match store_skills(pool, &skills).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Failed to store skills for program [{}]: {}", program.uuid, e);
                continue;
            }
        };

        if let Err(e) = catalog::replace_program_skills(pool, &program.uuid, &links).await {
            warn!("Failed to link skills for program [{}]: {}", program.uuid, e);
            continue;
        }

        info!("Updated {} skill tags for program [{}]", links.len(), program.uuid);
        bus.emit(TaxonomyEvent::SkillsRefreshed {
            product_type: ProductType::Program,
            product_key: program.uuid.to_string(),
            skill_count: links.len(),
            timestamp: chrono::Utc::now(),
        })
        .ok();
        refreshed += 1;
    }

    Ok(refreshed)
}

/// Refresh skill tags for the given xblocks
///
/// Unlike course and program links, xblock tags carry crowd votes: existing
/// vote records keep their counts and decision state; only missing records
/// are created (pending, zero votes).
pub async fn refresh_xblock_skills(
    pool: &SqlitePool,
    provider: &dyn XBlockMetadataProvider,
    extractor: &dyn SkillExtractor,
    usage_keys: &[String],
    bus: &EventBus,
) -> Result<usize> {
    info!("refresh_xblock_skills task triggered");

    let xblocks = provider.get_xblocks(usage_keys).await?;
    if xblocks.is_empty() {
        warn!("No xblock found with keys {:?} to update skills", usage_keys);
        return Ok(0);
    }

    let mut refreshed = 0;
    for xblock in &xblocks {
        let skills = match extractor.extract_skills(&xblock.content).await {
            Ok(skills) => skills,
            Err(e) => {
                warn!(
                    "Skill extraction failed for xblock [{}]: {}",
                    xblock.usage_key, e
                );
                continue;
            }
        };

        let result = async {
            let xblock_id =
                catalog::ensure_xblock(pool, &xblock.usage_key, &xblock.content_type).await?;
            let links = store_skills(pool, &skills).await?;
            for (skill_id, _confidence) in &links {
                skill_tags::create_pending(pool, xblock_id, *skill_id).await?;
            }
            Ok::<usize, taxonomy_common::Error>(links.len())
        }
        .await;

        match result {
            Ok(count) => {
                info!("Updated {} skill tags for xblock [{}]", count, xblock.usage_key);
                bus.emit(TaxonomyEvent::SkillsRefreshed {
                    product_type: ProductType::XBlock,
                    product_key: xblock.usage_key.clone(),
                    skill_count: count,
                    timestamp: chrono::Utc::now(),
                })
                .ok();
                refreshed += 1;
            }
            Err(e) => {
                warn!("Failed to store skills for xblock [{}]: {}", xblock.usage_key, e);
            }
        }
    }

    Ok(refreshed)
}

/// Upsert extracted skills into the catalog, returning (skill_id, confidence)
async fn store_skills(pool: &SqlitePool, skills: &[ExtractedSkill]) -> Result<Vec<(i64, f64)>> {
    let mut links = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill_id = catalog::upsert_skill(pool, skill).await?;
        links.push((skill_id, skill.confidence));
    }
    Ok(links)
}
