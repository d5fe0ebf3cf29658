use forwarder_pipeline::{RecordQuery, RecordReader};
use forwarder_storage::{
    ClientOptions, ConnectionManager, Handle, InMemoryTsdb, InfluxConfig, StorageError,
    TransportError,
};
use std::sync::Arc;

fn manager(store: &InMemoryTsdb) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(
        InfluxConfig::new("http://localhost:8086", "token", "acme-org", "telemetry"),
        ClientOptions::default(),
        Arc::new(store.clone()),
    ))
}

#[tokio::test]
async fn query_before_connect_is_uninitialized() {
    let store = InMemoryTsdb::new();
    let reader = RecordReader::new(manager(&store));

    let err = reader
        .query("from(bucket: \"telemetry\")")
        .await
        .expect_err("not connected");

    assert!(matches!(err, StorageError::Uninitialized(Handle::Query)));
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn successful_query_returns_empty() {
    let store = InMemoryTsdb::new();
    let manager = manager(&store);
    manager.connect().await.expect("connect");
    let reader = RecordReader::new(manager);

    let records = reader
        .query("from(bucket: \"telemetry\") |> range(start: -1h)")
        .await
        .expect("query");

    assert!(records.is_empty());
    assert_eq!(
        store.queries().last().map(String::as_str),
        Some("from(bucket: \"telemetry\") |> range(start: -1h)")
    );
}

#[tokio::test]
async fn rejected_query_is_execution_error() {
    let store = InMemoryTsdb::new();
    store.fail_query("bogus()");
    let manager = manager(&store);
    manager.connect().await.expect("connect");
    let reader = RecordReader::new(manager);

    let err = reader.query("bogus()").await.expect_err("rejected");

    assert!(matches!(
        err,
        StorageError::QueryExecution(TransportError::Status { status: 400, .. })
    ));
    assert!(err.to_string().starts_with("failed to execute query"));
}
