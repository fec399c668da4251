//! Skill tag verification engine
//!
//! Decides whether a pending skill tag transitions to verified or
//! blacklisted based on its accumulated votes, and runs that decision over
//! the whole pending set as one batch pass.
//!
//! A tag is verified when its verified count is above the minimum votes and
//! the ratio of verified count to total count is above the ratio threshold.
//! Blacklisting mirrors the check with the ignored count, against a stricter
//! ratio. All three values are configurable: per-invocation overrides take
//! precedence over the settings-table defaults; an invocation with neither
//! fails before any record is touched.

use crate::db::skill_tags::{self, PendingSkillTag};
use sqlx::SqlitePool;
use taxonomy_common::db::settings::get_setting;
use taxonomy_common::events::{EventBus, TaxonomyEvent};
use taxonomy_common::{Error, Result};
use tracing::{debug, info, warn};

/// Per-invocation threshold overrides (from CLI flags)
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdOverrides {
    pub min_votes: Option<i64>,
    pub ratio_threshold: Option<f64>,
    pub blacklist_ratio_threshold: Option<f64>,
}

/// Resolved thresholds for one verification pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationThresholds {
    /// Minimum vote count a tag must exceed before either decision
    pub min_votes: i64,
    /// Verified-to-total ratio a tag must exceed to be verified
    pub ratio_threshold: f64,
    /// Ignored-to-total ratio a tag must exceed to be blacklisted
    pub blacklist_ratio_threshold: f64,
}

impl VerificationThresholds {
    /// Resolve thresholds from overrides, falling back to settings defaults
    ///
    /// Fails with a configuration error when a threshold has neither an
    /// override nor a settings default, before any record is processed.
    pub async fn resolve(overrides: &ThresholdOverrides, db: &SqlitePool) -> Result<Self> {
        let min_votes = match overrides.min_votes {
            Some(value) => value,
            None => get_setting::<i64>(db, "verification_min_votes")
                .await?
                .ok_or_else(|| {
                    Error::Config(
                        "Either configure verification_min_votes in settings \
                         or pass --min-votes"
                            .to_string(),
                    )
                })?,
        };

        let ratio_threshold = match overrides.ratio_threshold {
            Some(value) => value,
            None => get_setting::<f64>(db, "verification_ratio_threshold")
                .await?
                .ok_or_else(|| {
                    Error::Config(
                        "Either configure verification_ratio_threshold in settings \
                         or pass --ratio-threshold"
                            .to_string(),
                    )
                })?,
        };

        let blacklist_ratio_threshold = match overrides.blacklist_ratio_threshold {
            Some(value) => value,
            None => get_setting::<f64>(db, "verification_blacklist_ratio_threshold")
                .await?
                .ok_or_else(|| {
                    Error::Config(
                        "Either configure verification_blacklist_ratio_threshold in settings \
                         or pass --blacklist-ratio-threshold"
                            .to_string(),
                    )
                })?,
        };

        let thresholds = Self {
            min_votes,
            ratio_threshold,
            blacklist_ratio_threshold,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<()> {
        if self.min_votes < 0 {
            return Err(Error::InvalidInput(format!(
                "min_votes must be non-negative, got {}",
                self.min_votes
            )));
        }
        for (name, value) in [
            ("ratio_threshold", self.ratio_threshold),
            ("blacklist_ratio_threshold", self.blacklist_ratio_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of evaluating one vote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Enough affirming votes: tag is correct
    Verified,
    /// Enough rejecting votes: tag is incorrect
    Blacklisted,
    /// Not yet decidable
    Pending,
}

/// Evaluate one vote record against the thresholds
///
/// A record with no votes at all is not yet decidable and stays pending
/// (this also guards the ratio computation against division by zero).
pub fn evaluate(
    verified_count: i64,
    ignored_count: i64,
    thresholds: &VerificationThresholds,
) -> Decision {
    let total = verified_count + ignored_count;
    if total == 0 {
        return Decision::Pending;
    }

    let has_min_votes = verified_count > thresholds.min_votes;
    let count_ratio = verified_count as f64 / total as f64;
    if has_min_votes && count_ratio > thresholds.ratio_threshold {
        return Decision::Verified;
    }

    let ignored_ratio = ignored_count as f64 / total as f64;
    if ignored_count > thresholds.min_votes && ignored_ratio > thresholds.blacklist_ratio_threshold
    {
        return Decision::Blacklisted;
    }

    Decision::Pending
}

/// Counters for one finalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Pending records examined
    pub examined: usize,
    /// Records transitioned to verified
    pub verified: usize,
    /// Records transitioned to blacklisted
    pub blacklisted: usize,
    /// Records left pending (includes records whose votes moved mid-pass)
    pub pending: usize,
    /// Records whose persistence failed; retried on the next pass
    pub failed: usize,
}

/// Run one finalization pass over all pending skill tags
///
/// Each record is evaluated and persisted independently: a failure on one
/// record never aborts the rest of the batch, and every transition is a
/// compare-and-set on the observed vote counts so concurrent vote increments
/// are never overwritten. Re-running the pass is a no-op for decided records
/// because they are excluded by the pending filter.
pub async fn run_finalization_pass(
    pool: &SqlitePool,
    thresholds: &VerificationThresholds,
    bus: &EventBus,
) -> Result<PassSummary> {
    info!("Starting xblockskill tags verification task");

    let pending = skill_tags::fetch_pending(pool).await?;

    let mut summary = PassSummary {
        examined: pending.len(),
        ..PassSummary::default()
    };

    for tag in &pending {
        match evaluate(tag.verified_count, tag.ignored_count, thresholds) {
            Decision::Verified => {
                apply_decision(pool, tag, Decision::Verified, bus, &mut summary).await;
            }
            Decision::Blacklisted => {
                apply_decision(pool, tag, Decision::Blacklisted, bus, &mut summary).await;
            }
            Decision::Pending => summary.pending += 1,
        }
    }

    info!("Xblockskill tags verification task is completed");

    bus.emit(TaxonomyEvent::VerificationPassCompleted {
        examined: summary.examined,
        verified: summary.verified,
        blacklisted: summary.blacklisted,
        pending: summary.pending,
        failed: summary.failed,
        timestamp: chrono::Utc::now(),
    })
    .ok();

    Ok(summary)
}

/// Persist one decision and account for it in the pass summary
async fn apply_decision(
    pool: &SqlitePool,
    tag: &PendingSkillTag,
    decision: Decision,
    bus: &EventBus,
    summary: &mut PassSummary,
) {
    let result = match decision {
        Decision::Verified => skill_tags::mark_verified(pool, tag).await,
        Decision::Blacklisted => skill_tags::mark_blacklisted(pool, tag).await,
        Decision::Pending => return,
    };

    match result {
        Ok(true) => match decision {
            Decision::Verified => {
                info!(
                    "[{}] skill tag for the xblock [{}] has been verified",
                    tag.skill_name, tag.usage_key
                );
                bus.emit(TaxonomyEvent::SkillTagVerified {
                    record_id: tag.id,
                    skill_name: tag.skill_name.clone(),
                    usage_key: tag.usage_key.clone(),
                    timestamp: chrono::Utc::now(),
                })
                .ok();
                summary.verified += 1;
            }
            Decision::Blacklisted => {
                info!(
                    "[{}] skill tag for the xblock [{}] has been blacklisted",
                    tag.skill_name, tag.usage_key
                );
                bus.emit(TaxonomyEvent::SkillTagBlacklisted {
                    record_id: tag.id,
                    skill_name: tag.skill_name.clone(),
                    usage_key: tag.usage_key.clone(),
                    timestamp: chrono::Utc::now(),
                })
                .ok();
                summary.blacklisted += 1;
            }
            Decision::Pending => unreachable!(),
        },
        Ok(false) => {
            // Vote counts moved between read and write; the next pass sees
            // the fresh counts.
            debug!(
                "[{}] votes changed during the pass for xblock [{}], left pending",
                tag.skill_name, tag.usage_key
            );
            summary.pending += 1;
        }
        Err(e) => {
            warn!(
                "[{}] failed to persist decision for xblock [{}]: {}",
                tag.skill_name, tag.usage_key, e
            );
            summary.failed += 1;
        }
    }
}
