use std::time::Duration;

use querylog::{QueryLog, QueryLogConfig, Store};
use testkit::{finish_record, start_record};

fn fast_config() -> QueryLogConfig {
    QueryLogConfig {
        flush_interval: Duration::from_millis(50),
        queue_capacity: 1024,
    }
}

#[tokio::test]
async fn writes_query_log_rows_end_to_end() {
    let store = Store::open_in_memory().unwrap();
    let mut log = QueryLog::new(store.clone(), "system", "query_log", fast_config());

    for i in 0..20 {
        log.submit(start_record(i)).await;
        log.submit(finish_record(i)).await;
    }
    log.shutdown().await;

    assert!(store.table_exists("system", "query_log").unwrap());
    assert_eq!(store.count_rows("system", "query_log").unwrap(), 40);
}

#[tokio::test]
async fn reuses_existing_compatible_table_across_instances() {
    let store = Store::open_in_memory().unwrap();

    let mut first = QueryLog::new(store.clone(), "system", "query_log", fast_config());
    first.submit(finish_record(0)).await;
    first.shutdown().await;

    let mut second = QueryLog::new(store.clone(), "system", "query_log", fast_config());
    second.submit(finish_record(1)).await;
    second.shutdown().await;

    assert_eq!(store.count_rows("system", "query_log").unwrap(), 2);
    assert!(!store.table_exists("system", "query_log_1").unwrap());
}

#[tokio::test]
async fn persists_to_disk_backed_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("querylog.duckdb")).unwrap();
    let mut log = QueryLog::new(store.clone(), "system", "query_log", fast_config());

    for i in 0..5 {
        log.submit(finish_record(i)).await;
    }
    log.shutdown().await;

    assert_eq!(store.count_rows("system", "query_log").unwrap(), 5);
}
