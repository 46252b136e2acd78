//! Durable store behaviour against a real SQLite file

mod common;

use candle_store::prelude::*;
use chrono::Duration;
use common::*;
use sea_orm::ConnectionTrait;

#[tokio::test]
async fn test_commit_is_idempotent() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let batch = hourly_candles(5);
    let cp = checkpoint("uid-a", t0(), t0() + Duration::hours(5));

    let first = repo.commit_candles(&cp, &batch).await.unwrap();
    assert_eq!(first, CommitSummary { inserted: 5, skipped: 0 });

    let second = repo.commit_candles(&cp, &batch).await.unwrap();
    assert_eq!(second, CommitSummary { inserted: 0, skipped: 5 });

    assert_eq!(repo.count_candles("uid-a").await.unwrap(), 5);
}

#[tokio::test]
async fn test_duplicates_within_batch_are_skipped() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let batch = vec![candle_at(0), candle_at(0), candle_at(1)];
    let cp = checkpoint("uid-a", t0(), t0() + Duration::hours(2));

    let summary = repo.commit_candles(&cp, &batch).await.unwrap();
    assert_eq!(summary, CommitSummary { inserted: 2, skipped: 1 });
    assert_eq!(repo.count_candles("uid-a").await.unwrap(), 2);
}

#[tokio::test]
async fn test_same_time_different_instruments() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let batch = hourly_candles(3);

    repo.commit_candles(&checkpoint("uid-a", t0(), t0()), &batch).await.unwrap();
    repo.commit_candles(&checkpoint("uid-b", t0(), t0()), &batch).await.unwrap();

    assert_eq!(repo.count_candles("uid-a").await.unwrap(), 3);
    assert_eq!(repo.count_candles("uid-b").await.unwrap(), 3);
}

#[tokio::test]
async fn test_round_trip_preserves_candles() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let batch = hourly_candles(150);
    let step = Quotation::new(0, 10_000_000);

    repo.commit_candles(&checkpoint("uid-a", t0(), t0()), &batch)
        .await
        .unwrap();

    let stored = repo.read_all_candles("uid-a", step).await.unwrap();
    assert_eq!(stored, batch);

    let middle = repo
        .read_candles_in_range("uid-a", step, t0() + Duration::hours(10), t0() + Duration::hours(20))
        .await
        .unwrap();
    assert_eq!(middle.len(), 11);
    assert_eq!(middle.first().unwrap().time, t0() + Duration::hours(10));
    assert_eq!(middle.last().unwrap().time, t0() + Duration::hours(20));
}

#[tokio::test]
async fn test_checkpoint_upsert() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let later = t0() + Duration::days(3);

    repo.commit_candles(&checkpoint("uid-a", t0(), t0() + Duration::days(1)), &[])
        .await
        .unwrap();
    repo.commit_candles(&checkpoint("uid-a", t0(), later), &[])
        .await
        .unwrap();

    let checkpoints = repo.read_checkpoints().await.unwrap();
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints["uid-a"], checkpoint("uid-a", t0(), later));
}

#[tokio::test]
async fn test_failed_insert_rolls_back_and_keeps_checkpoint() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    let before = checkpoint("uid-a", t0(), t0() + Duration::hours(1));
    repo.commit_candles(&before, &hourly_candles(1)).await.unwrap();

    repo.connection()
        .execute_unprepared("DROP TABLE candles")
        .await
        .unwrap();

    let err = repo
        .commit_candles(&checkpoint("uid-a", t0(), t0() + Duration::days(1)), &hourly_candles(5))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::CommitFailed { .. }));
    assert!(!err.candles_committed());

    let checkpoints = repo.read_checkpoints().await.unwrap();
    assert_eq!(checkpoints["uid-a"], before);
}

#[tokio::test]
async fn test_checkpoint_failure_keeps_candles() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();

    repo.connection()
        .execute_unprepared("DROP TABLE sync_checkpoints")
        .await
        .unwrap();

    let err = repo
        .commit_candles(&checkpoint("uid-a", t0(), t0() + Duration::days(1)), &hourly_candles(4))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::CheckpointInconsistent { .. }));
    assert!(err.is_warning());

    assert_eq!(repo.count_candles("uid-a").await.unwrap(), 4);
}

#[tokio::test]
async fn test_initialize_is_repeatable() {
    let (_dir, path) = temp_db();
    let repo = CandleRepository::initialize(&path).await.unwrap();
    repo.commit_candles(&checkpoint("uid-a", t0(), t0()), &hourly_candles(2))
        .await
        .unwrap();
    repo.close().await.unwrap();

    let repo = CandleRepository::initialize(&path).await.unwrap();
    assert_eq!(repo.count_candles("uid-a").await.unwrap(), 2);
    assert_eq!(repo.read_checkpoints().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_initialize_unreachable_path() {
    let err = CandleRepository::initialize("/nonexistent-dir/nested/candles.db")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StorageError::StoreUnavailable { .. }));
}
