//! Integration tests for verification schedule management

use std::path::PathBuf;
use taxonomy_common::db::init::init_database;
use taxonomy_common::events::{EventBus, TaxonomyEvent};
use taxonomy_vf::db::schedules;
use taxonomy_vf::scheduler::{apply_schedule, DEFAULT_SCHEDULE_NAME};

async fn setup(tag: &str) -> (sqlx::SqlitePool, PathBuf) {
    let path = PathBuf::from(format!(
        "/tmp/taxonomy-sched-test-{}-{}.db",
        tag,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let pool = init_database(&path).await.unwrap();
    (pool, path)
}

#[tokio::test]
async fn test_apply_schedule_round_trip() {
    let (pool, path) = setup("roundtrip").await;
    let bus = EventBus::new(16);

    let schedule = apply_schedule(&pool, DEFAULT_SCHEDULE_NAME, 60, true, &bus)
        .await
        .unwrap();
    assert_eq!(schedule.interval_minutes, 60);
    assert!(schedule.enabled);

    let active = schedules::get_enabled_schedule(&pool).await.unwrap();
    assert_eq!(active.unwrap().name, DEFAULT_SCHEDULE_NAME);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_apply_schedule_updates_in_place() {
    let (pool, path) = setup("update").await;
    let bus = EventBus::new(16);

    apply_schedule(&pool, DEFAULT_SCHEDULE_NAME, 60, true, &bus)
        .await
        .unwrap();
    let updated = apply_schedule(&pool, DEFAULT_SCHEDULE_NAME, 15, true, &bus)
        .await
        .unwrap();
    assert_eq!(updated.interval_minutes, 15);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_schedules")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "upsert must not duplicate the schedule");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_disabled_schedule_is_not_active() {
    let (pool, path) = setup("disabled").await;
    let bus = EventBus::new(16);

    apply_schedule(&pool, DEFAULT_SCHEDULE_NAME, 60, false, &bus)
        .await
        .unwrap();

    let active = schedules::get_enabled_schedule(&pool).await.unwrap();
    assert!(active.is_none());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_invalid_interval_rejected() {
    let (pool, path) = setup("invalid").await;
    let bus = EventBus::new(16);

    let result = apply_schedule(&pool, DEFAULT_SCHEDULE_NAME, 0, true, &bus).await;
    assert!(matches!(result, Err(taxonomy_common::Error::InvalidInput(_))));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_apply_schedule_emits_event() {
    let (pool, path) = setup("event").await;
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();

    apply_schedule(&pool, "nightly", 1440, true, &bus).await.unwrap();

    match rx.recv().await.unwrap() {
        TaxonomyEvent::ScheduleApplied {
            name,
            interval_minutes,
            enabled,
            ..
        } => {
            assert_eq!(name, "nightly");
            assert_eq!(interval_minutes, 1440);
            assert!(enabled);
        }
        other => panic!("expected ScheduleApplied, got {:?}", other),
    }

    let _ = std::fs::remove_file(&path);
}
