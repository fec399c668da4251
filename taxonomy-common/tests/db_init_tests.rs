//! Integration tests for database initialization
//!
//! Covers automatic database creation, idempotent schema application and
//! default-settings seeding.

use std::path::PathBuf;
use taxonomy_common::db::init::init_database;

fn temp_db_path(tag: &str) -> PathBuf {
    PathBuf::from(format!(
        "/tmp/taxonomy-test-db-{}-{}.db",
        tag,
        std::process::id()
    ))
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let db_path = temp_db_path("create");
    let _ = std::fs::remove_file(&db_path);

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let db_path = temp_db_path("existing");
    let _ = std::fs::remove_file(&db_path);

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Second open must succeed and leave the schema intact
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    drop(pool1);
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let db_path = temp_db_path("settings");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    let min_votes: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'verification_min_votes'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(min_votes.as_deref(), Some("2"));

    let ratio: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'verification_ratio_threshold'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(ratio.as_deref(), Some("0.5"));

    let blacklist_ratio: Option<String> = sqlx::query_scalar(
        "SELECT value FROM settings WHERE key = 'verification_blacklist_ratio_threshold'",
    )
    .fetch_optional(&pool)
    .await
    .unwrap();
    assert_eq!(blacklist_ratio.as_deref(), Some("0.9"));

    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_vote_record_flag_invariant_enforced() {
    let db_path = temp_db_path("invariant");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO skills (external_id, name) VALUES ('KS1', 'Rust')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO xblocks (usage_key, content_type) VALUES ('block-v1:a', 'video')")
        .execute(&pool)
        .await
        .unwrap();

    // Both terminal flags set at once must be rejected by the CHECK constraint
    let result = sqlx::query(
        r#"
        INSERT INTO xblock_skill_data (xblock_id, skill_id, verified, is_blacklisted)
        VALUES (1, 1, 1, 1)
        "#,
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "conflicting terminal flags were accepted");

    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_duplicate_skill_tag_rejected() {
    let db_path = temp_db_path("dup");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO skills (external_id, name) VALUES ('KS1', 'Rust')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO xblocks (usage_key, content_type) VALUES ('block-v1:a', 'video')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO xblock_skill_data (xblock_id, skill_id) VALUES (1, 1)")
        .execute(&pool)
        .await
        .unwrap();
    let duplicate = sqlx::query("INSERT INTO xblock_skill_data (xblock_id, skill_id) VALUES (1, 1)")
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "duplicate (xblock, skill) association was accepted");

    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}
