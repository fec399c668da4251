//! Schedule-driven verification
//!
//! Schedules live in the database; [`apply_schedule`] is the explicit step
//! the operator (or host system) runs after deciding the cadence, and
//! [`run_daemon`] executes finalization passes at that cadence. The daemon
//! re-reads the schedule every cycle, so edits take effect without a restart.

use crate::db::schedules;
use crate::engine::{self, ThresholdOverrides, VerificationThresholds};
use sqlx::SqlitePool;
use std::time::Duration;
use taxonomy_common::db::models::VerificationSchedule;
use taxonomy_common::events::{EventBus, TaxonomyEvent};
use taxonomy_common::{Error, Result};
use tracing::{error, info};

/// Name used when the operator does not pick one
pub const DEFAULT_SCHEDULE_NAME: &str = "skill-verification";

/// How long the daemon sleeps when no schedule is enabled
const IDLE_POLL: Duration = Duration::from_secs(60);

/// Create or update a verification schedule
///
/// This is the explicit orchestration step that replaces any save-time side
/// effect: persist the configuration, then call this to make it effective.
pub async fn apply_schedule(
    pool: &SqlitePool,
    name: &str,
    interval_minutes: i64,
    enabled: bool,
    bus: &EventBus,
) -> Result<VerificationSchedule> {
    if interval_minutes < 1 {
        return Err(Error::InvalidInput(format!(
            "interval_minutes must be at least 1, got {}",
            interval_minutes
        )));
    }

    let schedule = schedules::upsert_schedule(pool, name, interval_minutes, enabled).await?;

    info!(
        "Applied verification schedule [{}]: every {} minutes ({})",
        schedule.name,
        schedule.interval_minutes,
        if schedule.enabled { "enabled" } else { "disabled" }
    );

    bus.emit(TaxonomyEvent::ScheduleApplied {
        name: schedule.name.clone(),
        interval_minutes: schedule.interval_minutes,
        enabled: schedule.enabled,
        timestamp: chrono::Utc::now(),
    })
    .ok();

    Ok(schedule)
}

/// Run finalization passes on the configured schedule, forever
///
/// Threshold resolution is checked once at startup so a misconfigured
/// deployment fails immediately; thresholds are re-resolved before every pass
/// so settings edits apply without a restart. A failed pass is logged and the
/// daemon keeps running.
pub async fn run_daemon(
    pool: &SqlitePool,
    overrides: &ThresholdOverrides,
    bus: &EventBus,
) -> Result<()> {
    // Fail fast on missing threshold configuration
    VerificationThresholds::resolve(overrides, pool).await?;

    info!("Verification daemon started");

    loop {
        let schedule = match schedules::get_enabled_schedule(pool).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                info!(
                    "No enabled verification schedule; checking again in {}s",
                    IDLE_POLL.as_secs()
                );
                tokio::time::sleep(IDLE_POLL).await;
                continue;
            }
            Err(e) => {
                error!("Failed to read verification schedule: {}", e);
                tokio::time::sleep(IDLE_POLL).await;
                continue;
            }
        };

        match VerificationThresholds::resolve(overrides, pool).await {
            Ok(thresholds) => match engine::run_finalization_pass(pool, &thresholds, bus).await {
                Ok(summary) => info!(
                    "Pass complete: {} examined, {} verified, {} blacklisted, {} pending, {} failed",
                    summary.examined,
                    summary.verified,
                    summary.blacklisted,
                    summary.pending,
                    summary.failed
                ),
                Err(e) => error!("Verification pass failed: {}", e),
            },
            Err(e) => error!("Threshold resolution failed, skipping pass: {}", e),
        }

        tokio::time::sleep(Duration::from_secs(schedule.interval_minutes as u64 * 60)).await;
    }
}
