//! stdin 采集循环
//!
//! 每行一条 JSON 记录；无法解析的行告警并计数后跳过，写入失败告警后继续。
//! 读到 EOF 或收到停止信号时返回。

use domain::Record;
use forwarder_pipeline::RecordWriter;
use forwarder_telemetry::record_record_rejected;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// 一次采集循环的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub written: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// 从 stdin 读取直到 EOF 或 Ctrl-C
pub async fn run_stdin(writer: &dyn RecordWriter) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = BufReader::new(tokio::io::stdin());
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let summary = ingest_lines(stdin, writer, shutdown).await?;
    info!(
        target: "forwarder.ingest",
        written = summary.written,
        rejected = summary.rejected,
        failed = summary.failed,
        "ingest_finished"
    );
    Ok(())
}

pub async fn ingest_lines<R, S>(
    reader: R,
    writer: &dyn RecordWriter,
    shutdown: S,
) -> Result<IngestSummary, std::io::Error>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut summary = IngestSummary::default();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(target: "forwarder.ingest", "shutdown_requested");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: Record = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(err) => {
                record_record_rejected();
                summary.rejected += 1;
                warn!(target: "forwarder.ingest", error = %err, "record_decode_failed");
                continue;
            }
        };

        match writer.write(&record).await {
            Ok(_) => summary.written += 1,
            Err(err) => {
                summary.failed += 1;
                warn!(target: "forwarder.ingest", error = %err, "record_write_failed");
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forwarder_pipeline::TagRouteWriter;
    use forwarder_storage::{ClientOptions, ConnectionManager, InMemoryTsdb, InfluxConfig};
    use std::sync::Arc;

    async fn writer(store: &InMemoryTsdb) -> TagRouteWriter {
        let manager = Arc::new(ConnectionManager::new(
            InfluxConfig::new("http://localhost:8086", "token", "org", "bucket"),
            ClientOptions::default(),
            Arc::new(store.clone()),
        ));
        manager.connect().await.expect("connect");
        TagRouteWriter::new(manager)
    }

    #[tokio::test]
    async fn decodes_lines_and_skips_invalid() {
        let store = InMemoryTsdb::new();
        let writer = writer(&store).await;
        let input = concat!(
            r#"{"stage":"Post","customerName":"Acme","gateway":"gw1","fields":{"temp":21.5}}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"stage":"","fields":{"on":true}}"#,
            "\n",
        );

        let summary = ingest_lines(input.as_bytes(), &writer, std::future::pending())
            .await
            .expect("ingest");

        assert_eq!(
            summary,
            IngestSummary {
                written: 2,
                rejected: 1,
                failed: 0
            }
        );
        let measurements: Vec<String> = store
            .points()
            .iter()
            .map(|point| point.measurement().to_string())
            .collect();
        assert_eq!(measurements, vec!["Processed", "Original", "Processed"]);
    }

    #[tokio::test]
    async fn shutdown_stops_before_reading() {
        let store = InMemoryTsdb::new();
        let writer = writer(&store).await;
        let input = r#"{"stage":"Pre","fields":{"temp":1.0}}"#;

        let summary = ingest_lines(input.as_bytes(), &writer, std::future::ready(()))
            .await
            .expect("ingest");

        assert_eq!(summary, IngestSummary::default());
        assert!(store.points().is_empty());
    }

    #[tokio::test]
    async fn write_failures_are_counted() {
        let store = InMemoryTsdb::new();
        let writer = writer(&store).await;
        store.fail_flush("unavailable");
        let input = r#"{"stage":"Pre","fields":{"temp":1.0}}"#;

        let summary = ingest_lines(input.as_bytes(), &writer, std::future::pending())
            .await
            .expect("ingest");

        assert_eq!(summary.failed, 1);
    }
}
