//! Integration tests for the skill tag finalization pass
//!
//! Covers the decision procedure end to end over a real database: vote
//! thresholds, blacklisting, the zero-vote guard, missing configuration,
//! idempotence and the compare-and-set write guard.

use sqlx::SqlitePool;
use std::path::PathBuf;
use taxonomy_common::db::init::init_database;
use taxonomy_common::db::models::XBlockSkillRecord;
use taxonomy_common::db::settings::clear_setting;
use taxonomy_common::events::{EventBus, TaxonomyEvent};
use taxonomy_vf::db::skill_tags;
use taxonomy_vf::engine::{
    run_finalization_pass, ThresholdOverrides, VerificationThresholds,
};

const USAGE_KEY: &str = "block-v1:edX+DemoX+Demo_Course+type@video+block@intro";

struct TestDb {
    pool: SqlitePool,
    path: PathBuf,
}

impl TestDb {
    async fn new(tag: &str) -> Self {
        let path = PathBuf::from(format!(
            "/tmp/taxonomy-vf-test-{}-{}.db",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let pool = init_database(&path).await.unwrap();
        Self { pool, path }
    }

    /// Seed one skill tag vote record and return its id
    async fn seed_record(&self, verified_count: i64, ignored_count: i64) -> i64 {
        sqlx::query("INSERT OR IGNORE INTO skills (external_id, name) VALUES ('KS1', 'Rust')")
            .execute(&self.pool)
            .await
            .unwrap();
        sqlx::query("INSERT OR IGNORE INTO xblocks (usage_key, content_type) VALUES (?, 'video')")
            .bind(USAGE_KEY)
            .execute(&self.pool)
            .await
            .unwrap();

        let result = sqlx::query(
            r#"
            INSERT INTO xblock_skill_data (xblock_id, skill_id, verified_count, ignored_count)
            SELECT x.id, s.id, ?, ?
            FROM xblocks x, skills s
            WHERE x.usage_key = ? AND s.external_id = 'KS1'
            "#,
        )
        .bind(verified_count)
        .bind(ignored_count)
        .bind(USAGE_KEY)
        .execute(&self.pool)
        .await
        .unwrap();

        result.last_insert_rowid()
    }

    async fn record(&self, id: i64) -> XBlockSkillRecord {
        sqlx::query_as::<_, XBlockSkillRecord>(
            r#"
            SELECT id, xblock_id, skill_id, verified_count, ignored_count,
                   verified, is_blacklisted
            FROM xblock_skill_data WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn record_flags(&self, id: i64) -> (bool, bool) {
        let record = self.record(id).await;
        (record.verified, record.is_blacklisted)
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn default_thresholds(pool: &SqlitePool) -> VerificationThresholds {
    VerificationThresholds::resolve(&ThresholdOverrides::default(), pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_pass_with_no_pending_records() {
    let db = TestDb::new("empty").await;
    let bus = EventBus::new(16);
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.examined, 0);
    assert_eq!(summary.verified, 0);
    assert_eq!(summary.blacklisted, 0);
}

#[tokio::test]
async fn test_below_minimum_votes_stays_pending() {
    let db = TestDb::new("minvotes").await;
    let id = db.seed_record(1, 0).await;
    let bus = EventBus::new(16);
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.examined, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(db.record_flags(id).await, (false, false));
}

#[tokio::test]
async fn test_below_ratio_threshold_stays_pending() {
    let db = TestDb::new("ratio").await;
    let id = db.seed_record(1, 3).await;
    let bus = EventBus::new(16);
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.pending, 1);
    assert_eq!(db.record_flags(id).await, (false, false));
}

#[tokio::test]
async fn test_no_votes_stays_pending() {
    let db = TestDb::new("novotes").await;
    let id = db.seed_record(0, 0).await;
    let bus = EventBus::new(16);
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.examined, 1);
    assert_eq!(summary.pending, 1);
    let record = db.record(id).await;
    assert!(record.is_pending());
    assert_eq!(record.total_votes(), 0);
}

#[tokio::test]
async fn test_sufficient_votes_verifies_and_emits_event() {
    let db = TestDb::new("verify").await;
    let id = db.seed_record(3, 1).await;
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.verified, 1);
    assert_eq!(db.record_flags(id).await, (true, false));

    match rx.recv().await.unwrap() {
        TaxonomyEvent::SkillTagVerified {
            record_id,
            skill_name,
            usage_key,
            ..
        } => {
            assert_eq!(record_id, id);
            assert_eq!(skill_name, "Rust");
            assert_eq!(usage_key, USAGE_KEY);
        }
        other => panic!("expected SkillTagVerified, got {:?}", other),
    }
}

#[tokio::test]
async fn test_heavily_ignored_tag_is_blacklisted() {
    let db = TestDb::new("blacklist").await;
    let id = db.seed_record(2, 20).await;
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let thresholds = default_thresholds(&db.pool).await;

    let summary = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    assert_eq!(summary.blacklisted, 1);
    assert_eq!(db.record_flags(id).await, (false, true));

    match rx.recv().await.unwrap() {
        TaxonomyEvent::SkillTagBlacklisted { record_id, .. } => assert_eq!(record_id, id),
        other => panic!("expected SkillTagBlacklisted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_configuration_fails_before_processing() {
    let db = TestDb::new("noconfig").await;
    let id = db.seed_record(3, 1).await;

    clear_setting(&db.pool, "verification_min_votes").await.unwrap();

    let result =
        VerificationThresholds::resolve(&ThresholdOverrides::default(), &db.pool).await;
    assert!(matches!(result, Err(taxonomy_common::Error::Config(_))));

    // The record was never touched
    assert_eq!(db.record_flags(id).await, (false, false));
}

#[tokio::test]
async fn test_cli_override_substitutes_for_missing_setting() {
    let db = TestDb::new("override").await;
    clear_setting(&db.pool, "verification_min_votes").await.unwrap();

    let overrides = ThresholdOverrides {
        min_votes: Some(4),
        ..ThresholdOverrides::default()
    };
    let thresholds = VerificationThresholds::resolve(&overrides, &db.pool)
        .await
        .unwrap();

    assert_eq!(thresholds.min_votes, 4);
    assert!((thresholds.ratio_threshold - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_pass_is_idempotent() {
    let db = TestDb::new("idempotent").await;
    let id = db.seed_record(3, 1).await;
    let bus = EventBus::new(16);
    let thresholds = default_thresholds(&db.pool).await;

    let first = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();
    assert_eq!(first.verified, 1);

    // Second pass sees no pending records and changes nothing
    let second = run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();
    assert_eq!(second.examined, 0);
    assert_eq!(second.verified, 0);
    assert_eq!(db.record_flags(id).await, (true, false));
}

#[tokio::test]
async fn test_decision_write_is_guarded_on_observed_counts() {
    let db = TestDb::new("cas").await;
    let id = db.seed_record(3, 1).await;

    let pending = skill_tags::fetch_pending(&db.pool).await.unwrap();
    assert_eq!(pending.len(), 1);
    let tag = &pending[0];

    // A concurrent voter moves the counts between read and write
    sqlx::query("UPDATE xblock_skill_data SET ignored_count = ignored_count + 1 WHERE id = ?")
        .bind(id)
        .execute(&db.pool)
        .await
        .unwrap();

    let applied = skill_tags::mark_verified(&db.pool, tag).await.unwrap();
    assert!(!applied, "stale decision must not be applied");
    assert_eq!(db.record_flags(id).await, (false, false));

    // A fresh read observes the new counts and the decision applies
    let pending = skill_tags::fetch_pending(&db.pool).await.unwrap();
    let applied = skill_tags::mark_verified(&db.pool, &pending[0]).await.unwrap();
    assert!(applied);
    assert_eq!(db.record_flags(id).await, (true, false));
}

#[tokio::test]
async fn test_decided_record_is_never_redecided() {
    let db = TestDb::new("terminal").await;
    let id = db.seed_record(3, 1).await;

    let pending = skill_tags::fetch_pending(&db.pool).await.unwrap();
    let tag = pending[0].clone();

    assert!(skill_tags::mark_verified(&db.pool, &tag).await.unwrap());

    // The same stale handle cannot blacklist an already-verified record
    let applied = skill_tags::mark_blacklisted(&db.pool, &tag).await.unwrap();
    assert!(!applied);
    assert_eq!(db.record_flags(id).await, (true, false));
}

#[tokio::test]
async fn test_pass_summary_event_emitted() {
    let db = TestDb::new("summary").await;
    db.seed_record(3, 1).await;
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let thresholds = default_thresholds(&db.pool).await;

    run_finalization_pass(&db.pool, &thresholds, &bus)
        .await
        .unwrap();

    // First event is the per-tag decision, second the pass summary
    let mut saw_summary = false;
    while let Ok(event) = rx.try_recv() {
        if let TaxonomyEvent::VerificationPassCompleted {
            examined, verified, ..
        } = event
        {
            assert_eq!(examined, 1);
            assert_eq!(verified, 1);
            saw_summary = true;
        }
    }
    assert!(saw_summary, "VerificationPassCompleted was not emitted");
}
