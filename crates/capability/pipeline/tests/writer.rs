mod common;

use chrono::{TimeZone, Utc};
use common::LogCapture;
use domain::{FieldValue, Fields, Record, Stage};
use forwarder_pipeline::{Measurement, RecordWriter, TagRouteWriter};
use forwarder_storage::{
    ClientOptions, ConnectionManager, Handle, InMemoryTsdb, InfluxConfig, StorageError,
    TransportError,
};
use std::sync::Arc;

async fn connected(store: &InMemoryTsdb) -> Arc<ConnectionManager> {
    let manager = Arc::new(ConnectionManager::new(
        InfluxConfig::new("http://localhost:8086", "token", "acme-org", "telemetry"),
        ClientOptions::default(),
        Arc::new(store.clone()),
    ));
    manager.connect().await.expect("connect");
    manager
}

fn record(stage: Stage) -> Record {
    let mut fields = Fields::new();
    fields.insert("temp".to_string(), FieldValue::Float(21.5));
    Record {
        stage,
        customer_name: "Acme".to_string(),
        gateway: "gw1".to_string(),
        fields,
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ..Record::default()
    }
}

#[tokio::test]
async fn post_record_goes_to_processed_only() {
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);
    let record = record(Stage::Post);

    let result = writer.write(&record).await.expect("write");

    assert_eq!(result.measurements, vec![Measurement::Processed]);
    let points = store.points();
    assert_eq!(points.len(), 1);
    let point = &points[0];
    assert_eq!(point.measurement(), "Processed");
    assert_eq!(point.tags()["site"], "Unknown site");
    assert_eq!(point.tags()["customer"], "Acme");
    assert_eq!(point.tags()["gateway"], "gw1");
    assert_eq!(point.tags().len(), 10);
    assert_eq!(point.fields(), &record.fields);
    assert_eq!(point.timestamp(), record.timestamp);
    assert!(store.pending_points().is_empty());
}

#[tokio::test]
async fn pre_record_goes_to_original_only() {
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    writer.write(&record(Stage::Pre)).await.expect("write");

    let points = store.points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].measurement(), "Original");
}

#[tokio::test]
async fn unspecified_record_goes_to_both() {
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    let result = writer
        .write(&record(Stage::Unspecified))
        .await
        .expect("write");

    assert_eq!(
        result.measurements,
        vec![Measurement::Original, Measurement::Processed]
    );
    let points = store.points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].measurement(), "Original");
    assert_eq!(points[1].measurement(), "Processed");
    assert_eq!(points[0].tags(), points[1].tags());
    assert_eq!(points[0].fields(), points[1].fields());
    assert_eq!(points[0].timestamp(), points[1].timestamp());
}

#[tokio::test]
async fn every_write_is_flushed() {
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    writer
        .write_batch(&[record(Stage::Pre), record(Stage::Post)])
        .await
        .expect("write batch");

    assert_eq!(store.flush_count(), 2);
    assert_eq!(store.points().len(), 2);
}

#[tokio::test]
async fn post_logs_info_and_debug_lines() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    writer.write(&record(Stage::Post)).await.expect("write");

    let line = "gw1 :: Acme ::  ::  ::  ::  ::  :: ";
    assert_eq!(logs.count("INFO", line), 1);
    assert_eq!(logs.count("DEBUG", &format!("{line} :: Post")), 1);
    assert!(logs.contents().contains("data="));
}

#[tokio::test]
async fn pre_logs_debug_only() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    writer.write(&record(Stage::Pre)).await.expect("write");

    assert_eq!(logs.count("INFO", "gw1 :: Acme"), 0);
    assert_eq!(logs.count("DEBUG", "gw1 :: Acme ::  ::  ::  ::  ::  ::  :: Pre"), 1);
}

#[tokio::test]
async fn empty_stage_debug_line_has_no_suffix() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    writer
        .write(&record(Stage::Unspecified))
        .await
        .expect("write");

    let line = "gw1 :: Acme ::  ::  ::  ::  ::  :: ";
    assert_eq!(logs.count("INFO", line), 1);
    assert_eq!(logs.count("DEBUG", line), 1);
    assert_eq!(logs.count("DEBUG", &format!("{line} :: ")), 0);
}

#[tokio::test]
async fn unrecognized_stage_keeps_label_and_writes_both() {
    let logs = LogCapture::default();
    let _guard = logs.install();
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);
    let record: Record = serde_json::from_str(
        r#"{"stage":"Intermediate","customerName":"Acme","gateway":"gw1","fields":{"v":1}}"#,
    )
    .expect("decode");

    let result = writer.write(&record).await.expect("write");

    assert_eq!(
        result.measurements,
        vec![Measurement::Original, Measurement::Processed]
    );
    assert_eq!(store.points().len(), 2);
    assert_eq!(logs.count("INFO", "gw1 :: Acme"), 1);
    assert_eq!(
        logs.count("DEBUG", "gw1 :: Acme ::  ::  ::  ::  ::  ::  :: Intermediate"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_share_one_connection() {
    const WRITERS: usize = 32;
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);

    let mut tasks = Vec::with_capacity(WRITERS);
    for index in 0..WRITERS {
        let writer = writer.clone();
        let stage = if index % 2 == 0 {
            Stage::Pre
        } else {
            Stage::Unspecified
        };
        let record = record(stage);
        tasks.push(tokio::spawn(async move { writer.write(&record).await }));
    }
    for task in tasks {
        task.await.expect("join").expect("write");
    }

    // 一半单写，一半双写
    assert_eq!(store.points().len(), WRITERS / 2 + WRITERS);
    assert!(store.pending_points().is_empty());
    assert_eq!(store.connection_count(), 1);
}

#[tokio::test]
async fn write_without_connection_is_uninitialized() {
    let store = InMemoryTsdb::new();
    let manager = Arc::new(ConnectionManager::new(
        InfluxConfig::new("http://localhost:8086", "token", "acme-org", "telemetry"),
        ClientOptions::default(),
        Arc::new(store.clone()),
    ));
    let writer = TagRouteWriter::new(manager);

    let err = writer
        .write(&record(Stage::Post))
        .await
        .expect_err("not connected");

    assert!(matches!(err, StorageError::Uninitialized(Handle::Write)));
    assert_eq!(err.to_string(), "writeAPI is not initialized");
    assert!(store.points().is_empty());
}

#[tokio::test]
async fn write_after_disconnect_is_uninitialized() {
    let store = InMemoryTsdb::new();
    let manager = connected(&store).await;
    let writer = TagRouteWriter::new(Arc::clone(&manager));
    manager.disconnect().await;

    let err = writer
        .write(&record(Stage::Pre))
        .await
        .expect_err("disconnected");
    assert!(matches!(err, StorageError::Uninitialized(Handle::Write)));
}

#[tokio::test]
async fn flush_failure_surfaces_as_write_error() {
    let store = InMemoryTsdb::new();
    let writer = TagRouteWriter::new(connected(&store).await);
    store.fail_flush("server unavailable");

    let err = writer
        .write(&record(Stage::Post))
        .await
        .expect_err("flush failed");

    assert!(matches!(
        err,
        StorageError::Write(TransportError::Rejected(_))
    ));
    assert_eq!(store.pending_points().len(), 1);
}
