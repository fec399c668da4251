//! Skill Tag Verifier (taxonomy-vf) - Main entry point
//!
//! Finalizes crowd-voted skill tags on demand (`finalize`) or on a stored
//! schedule (`daemon`), manages that schedule (`apply-schedule`), and
//! re-tags products from a metadata export (`refresh`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use taxonomy_common::config::{prepare_data_folder, resolve_data_folder};
use taxonomy_common::events::EventBus;
use taxonomy_vf::engine::{self, ThresholdOverrides, VerificationThresholds};
use taxonomy_vf::providers::JsonFileProvider;
use taxonomy_vf::extractors::HttpSkillsClient;
use taxonomy_vf::{refresh, scheduler};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command-line arguments for taxonomy-vf
#[derive(Parser, Debug)]
#[command(name = "taxonomy-vf")]
#[command(about = "Skill tag verification service for the taxonomy platform")]
#[command(version)]
struct Args {
    /// Data folder containing the taxonomy database
    #[arg(short, long, env = "TAXONOMY_DATA_FOLDER")]
    data_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one finalization pass over the pending skill tags
    Finalize {
        /// Minimum number of votes required for verification
        #[arg(long)]
        min_votes: Option<i64>,

        /// Ratio of verified votes to total votes for verification
        #[arg(long)]
        ratio_threshold: Option<f64>,

        /// Ratio of ignored votes to total votes for blacklisting
        #[arg(long)]
        blacklist_ratio_threshold: Option<f64>,
    },

    /// Run finalization passes on the stored schedule
    Daemon {
        /// Minimum number of votes required for verification
        #[arg(long)]
        min_votes: Option<i64>,

        /// Ratio of verified votes to total votes for verification
        #[arg(long)]
        ratio_threshold: Option<f64>,

        /// Ratio of ignored votes to total votes for blacklisting
        #[arg(long)]
        blacklist_ratio_threshold: Option<f64>,
    },

    /// Create or update the periodic verification schedule
    ApplySchedule {
        /// Schedule name
        #[arg(long, default_value = scheduler::DEFAULT_SCHEDULE_NAME)]
        name: String,

        /// Minutes between finalization passes
        #[arg(long)]
        interval_minutes: i64,

        /// Store the schedule but keep it inactive
        #[arg(long)]
        disabled: bool,
    },

    /// Re-tag products with skills extracted from their metadata
    Refresh {
        /// Kind of product to refresh
        #[arg(long, value_enum)]
        product: Product,

        /// JSON metadata export from the host platform
        #[arg(long)]
        input: PathBuf,

        /// Product ids: course/program UUIDs or xblock usage keys
        #[arg(long, required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Product {
    Course,
    Program,
    Xblock,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxonomy_vf=info,taxonomy_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Taxonomy Skill Tag Verifier v{}", env!("CARGO_PKG_VERSION"));

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), "TAXONOMY_DATA_FOLDER");
    let db_path = prepare_data_folder(&data_folder).context("Failed to prepare data folder")?;
    info!("Database path: {}", db_path.display());

    let pool = taxonomy_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let bus = EventBus::new(256);

    match args.command {
        Command::Finalize {
            min_votes,
            ratio_threshold,
            blacklist_ratio_threshold,
        } => {
            let overrides = ThresholdOverrides {
                min_votes,
                ratio_threshold,
                blacklist_ratio_threshold,
            };
            let thresholds = VerificationThresholds::resolve(&overrides, &pool)
                .await
                .context("Threshold configuration missing")?;

            let summary = engine::run_finalization_pass(&pool, &thresholds, &bus).await?;
            info!(
                "Pass complete: {} examined, {} verified, {} blacklisted, {} pending, {} failed",
                summary.examined,
                summary.verified,
                summary.blacklisted,
                summary.pending,
                summary.failed
            );
        }

        Command::Daemon {
            min_votes,
            ratio_threshold,
            blacklist_ratio_threshold,
        } => {
            let overrides = ThresholdOverrides {
                min_votes,
                ratio_threshold,
                blacklist_ratio_threshold,
            };

            tokio::select! {
                result = scheduler::run_daemon(&pool, &overrides, &bus) => {
                    result.context("Verification daemon failed")?;
                }
                _ = shutdown_signal() => {
                    info!("Verification daemon stopped");
                }
            }
        }

        Command::ApplySchedule {
            name,
            interval_minutes,
            disabled,
        } => {
            scheduler::apply_schedule(&pool, &name, interval_minutes, !disabled, &bus).await?;
        }

        Command::Refresh { product, input, ids } => {
            let provider = JsonFileProvider::from_path(&input)
                .context("Failed to load metadata export")?;
            let extractor = HttpSkillsClient::from_settings(&pool)
                .await
                .context("Skills extraction API is not configured")?;

            let refreshed = match product {
                Product::Course => {
                    let uuids = parse_uuids(&ids)?;
                    refresh::refresh_course_skills(&pool, &provider, &extractor, &uuids, &bus)
                        .await?
                }
                Product::Program => {
                    let uuids = parse_uuids(&ids)?;
                    refresh::refresh_program_skills(&pool, &provider, &extractor, &uuids, &bus)
                        .await?
                }
                Product::Xblock => {
                    refresh::refresh_xblock_skills(&pool, &provider, &extractor, &ids, &bus)
                        .await?
                }
            };
            info!("Refreshed skill tags for {} products", refreshed);
        }
    }

    Ok(())
}

fn parse_uuids(ids: &[String]) -> Result<Vec<Uuid>> {
    ids.iter()
        .map(|id| Uuid::parse_str(id).with_context(|| format!("Invalid product UUID: {}", id)))
        .collect()
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
