//! 遥测转发进程：stdin NDJSON 记录 → InfluxDB，或执行一次查询。

mod ingest;

use forwarder_config::AppConfig;
use forwarder_pipeline::{RecordQuery, RecordReader, TagRouteWriter};
use forwarder_storage::{
    ClientOptions, ConnectionManager, InMemoryTsdb, InfluxConfig, InfluxConnector, TsdbConnector,
};
use forwarder_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // dry-run 时写入内存实现，不访问 InfluxDB
    let connector: Arc<dyn TsdbConnector> = if config.dry_run {
        info!(target: "forwarder", "dry_run_enabled");
        Arc::new(InMemoryTsdb::new())
    } else {
        Arc::new(InfluxConnector)
    };
    let connection = Arc::new(ConnectionManager::new(
        InfluxConfig::new(
            config.influx_url.clone(),
            config.influx_token.clone(),
            config.influx_org.clone(),
            config.influx_bucket.clone(),
        ),
        client_options(&config),
        connector,
    ));
    connection.connect().await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.split_first() {
        Some((command, rest)) if command == "query" => {
            run_query(Arc::clone(&connection), &rest.join(" ")).await
        }
        _ => {
            let writer = TagRouteWriter::new(Arc::clone(&connection));
            ingest::run_stdin(&writer).await
        }
    };

    // 断开前投递缓冲区剩余的点
    connection.disconnect().await;
    let snapshot = metrics().snapshot();
    info!(
        target: "forwarder",
        records_written = snapshot.records_written,
        write_failures = snapshot.write_failures,
        points_submitted = snapshot.points_submitted,
        flushes = snapshot.flushes,
        flush_latency_ms_total = snapshot.flush_latency_ms_total,
        queries_executed = snapshot.queries_executed,
        query_failures = snapshot.query_failures,
        records_rejected = snapshot.records_rejected,
        "forwarder_stopped"
    );
    outcome
}

async fn run_query(
    connection: Arc<ConnectionManager>,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = RecordReader::new(connection);
    let records = reader.query(query).await?;
    info!(target: "forwarder", records = records.len(), "query_finished");
    Ok(())
}

fn client_options(config: &AppConfig) -> ClientOptions {
    ClientOptions {
        batch_size: config.write_batch_size,
        flush_interval: Duration::from_millis(config.write_flush_interval_ms),
        retry_interval: Duration::from_millis(config.write_retry_interval_ms),
        max_retries: config.write_max_retries,
        max_buffer_lines: config.write_max_buffer_lines,
        request_timeout: Duration::from_millis(config.http_timeout_ms),
    }
}
