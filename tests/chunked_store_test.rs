// ==========================================
// 分块结果存储集成测试
// ==========================================
// 测试目标:
// - 写入顺序: 元数据 → 分块 → 最新指针
// - 写入失败补偿删除,指针不前移
// - SQLite 落盘后重新打开可读取
// ==========================================

mod test_helpers;

use distributor_commission::config::StoreConfig;
use distributor_commission::domain::calculation::CalculationResult;
use distributor_commission::domain::types::RateSource;
use distributor_commission::repository::calculation_store::{chunk_key, metadata_key};
use distributor_commission::repository::{
    ChunkedResultStore, KeyValueStore, RepositoryError, SqliteKeyValueStore, LATEST_KEY,
};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{create_test_db, FailingStore};

fn results(count: usize) -> Vec<CalculationResult> {
    (0..count)
        .map(|i| CalculationResult {
            distributor_id: format!("D{}", i % 3),
            article_id: "A1".to_string(),
            billing_document: format!("INV-{}", i),
            billing_date: None,
            billing_quantity: 2.0,
            net_sales: 20.0,
            commission: 1.0,
            group_total_quantity: 2.0,
            group_total_value: 20.0,
            rate: 0.5,
            rate_source: RateSource::SlabMatch { slab_index: 0 },
            group_commission: 1.0,
        })
        .collect()
}

fn config(chunk_size: usize) -> StoreConfig {
    StoreConfig {
        chunk_size,
        chunk_write_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_chunk_failure_compensates_and_keeps_previous_pointer() {
    let kv = Arc::new(FailingStore::new());
    let store = ChunkedResultStore::new(kv.clone(), config(2));

    let previous = store.store("o", "S1", "first", &results(3)).await.unwrap();

    kv.fail_on("/chunk/2");
    let err = store.store("o", "S1", "second", &results(6)).await.unwrap_err();

    match err {
        RepositoryError::StorageFailure {
            stage,
            written_chunks,
            total_chunks,
            ..
        } => {
            assert_eq!(stage, "chunk");
            assert_eq!(written_chunks, 2);
            assert_eq!(total_chunks, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 失败计算的元数据与已写分块均被删除
    let keys = kv.key_set("o").await;
    assert_eq!(keys.len(), 4, "only the first calculation should remain: {:?}", keys);
    assert!(keys.contains(&metadata_key(&previous.calculation_id)));

    // 指针仍指向上一次成功的计算
    let latest = store.retrieve_latest("o").await.unwrap().unwrap();
    assert_eq!(latest.metadata.calculation_id, previous.calculation_id);
}

#[tokio::test]
async fn test_metadata_failure_writes_nothing() {
    let kv = Arc::new(FailingStore::new());
    kv.fail_on("/meta");
    let store = ChunkedResultStore::new(kv.clone(), config(2));

    let err = store.store("o", "S1", "x", &results(3)).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::StorageFailure { ref stage, written_chunks: 0, .. } if stage == "metadata"
    ));
    assert!(kv.key_set("o").await.is_empty());
    assert_eq!(kv.deleted_keys().len(), 1);
}

#[tokio::test]
async fn test_pointer_failure_removes_all_chunks() {
    let kv = Arc::new(FailingStore::new());
    kv.fail_on(LATEST_KEY);
    let store = ChunkedResultStore::new(kv.clone(), config(2));

    let err = store.store("o", "S1", "x", &results(5)).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::StorageFailure { ref stage, written_chunks: 3, .. } if stage == "pointer"
    ));
    assert!(kv.key_set("o").await.is_empty());
    assert!(store.retrieve_latest("o").await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_chunk_reported_as_gap() {
    let kv = Arc::new(FailingStore::new());
    let store = ChunkedResultStore::new(kv.clone(), config(2));
    let receipt = store.store("o", "S1", "x", &results(4)).await.unwrap();

    kv.set(
        "o",
        &chunk_key(&receipt.calculation_id, 0),
        serde_json::json!({"not": "a chunk"}),
    )
    .await
    .unwrap();

    let retrieved = store.retrieve_latest("o").await.unwrap().unwrap();
    assert_eq!(retrieved.missing_chunks, vec![0]);
    assert_eq!(retrieved.results.len(), 2);
}

#[tokio::test]
async fn test_pointer_without_metadata_is_not_found() {
    let kv = Arc::new(FailingStore::new());
    let store = ChunkedResultStore::new(kv.clone(), config(2));
    let receipt = store.store("o", "S1", "x", &results(1)).await.unwrap();

    kv.delete("o", &metadata_key(&receipt.calculation_id))
        .await
        .unwrap();

    let err = store.retrieve_latest("o").await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_stores_last_pointer_wins() {
    let kv = Arc::new(FailingStore::new());
    let store = Arc::new(ChunkedResultStore::new(kv.clone(), config(1)));

    let a = {
        let store = store.clone();
        tokio::spawn(async move { store.store("o", "S1", "a", &results(3)).await })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move { store.store("o", "S2", "b", &results(2)).await })
    };
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    // 两次计算均完整可读
    for id in [&a.calculation_id, &b.calculation_id] {
        let retrieved = store.retrieve("o", id).await.unwrap().unwrap();
        assert!(retrieved.is_complete());
    }

    let pointer = store.latest_pointer("o").await.unwrap().unwrap();
    assert!(pointer.calculation_id == a.calculation_id || pointer.calculation_id == b.calculation_id);
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let input = results(7);

    let calculation_id = {
        let kv = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
        let store = ChunkedResultStore::new(kv, config(3));
        store.store("owner-1", "S1", "persisted", &input).await.unwrap().calculation_id
    };

    let kv = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
    let store = ChunkedResultStore::new(kv, config(3));
    let retrieved = store.retrieve_latest("owner-1").await.unwrap().unwrap();

    assert_eq!(retrieved.metadata.calculation_id, calculation_id);
    assert_eq!(retrieved.metadata.total_chunks, 3);
    assert_eq!(retrieved.results, input);
}

#[tokio::test]
async fn test_chunk_write_delay_applied_between_chunks() {
    let kv = Arc::new(FailingStore::new());
    let store = ChunkedResultStore::new(
        kv,
        StoreConfig {
            chunk_size: 1,
            chunk_write_delay: Duration::from_millis(20),
        },
    );

    let started = tokio::time::Instant::now();
    store.store("o", "S1", "x", &results(3)).await.unwrap();
    // 3 块 → 2 次间隔
    assert!(started.elapsed() >= Duration::from_millis(40));
}

/// 分配结果常见的非整除小数
fn fractional_results(count: usize) -> Vec<CalculationResult> {
    let mut records = results(count);
    for (i, record) in records.iter_mut().enumerate() {
        let share = 1234.56 * ((i % 5) + 1) as f64 / (i + 7) as f64;
        record.commission = share;
        record.group_commission = share * 3.0;
        record.billing_quantity = 1.0 / (i + 3) as f64;
        record.rate = 0.1 + i as f64 / 3.0;
    }
    records
}

#[tokio::test]
async fn test_sqlite_round_trip_preserves_fractional_values() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let kv = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
    let store = ChunkedResultStore::new(kv, config(500));

    for count in [499usize, 500, 501, 1500] {
        let input = fractional_results(count);
        let receipt = store.store("owner-1", "S1", "fractions", &input).await.unwrap();

        let retrieved = store
            .retrieve("owner-1", &receipt.calculation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(retrieved.is_complete(), "count={}", count);
        assert_eq!(retrieved.results, input, "count={}", count);
    }
}

#[tokio::test]
async fn test_sqlite_unparsable_chunk_reported_as_gap() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let kv = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
    let store = ChunkedResultStore::new(kv, config(1));
    let input = results(3);
    let receipt = store.store("o", "S1", "x", &input).await.unwrap();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let updated = conn
        .execute(
            "UPDATE kv_entry SET value_json = '{broken' WHERE namespace = ?1 AND key = ?2",
            rusqlite::params!["o", chunk_key(&receipt.calculation_id, 1)],
        )
        .unwrap();
    assert_eq!(updated, 1);

    let retrieved = store.retrieve_latest("o").await.unwrap().unwrap();
    assert_eq!(retrieved.missing_chunks, vec![1]);
    assert_eq!(retrieved.results, vec![input[0].clone(), input[2].clone()]);
}
