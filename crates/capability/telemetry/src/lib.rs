//! 日志初始化与写入指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub write_failures: u64,
    pub points_submitted: u64,
    pub flushes: u64,
    pub flush_latency_ms_total: u64,
    pub flush_latency_ms_count: u64,
    pub queries_executed: u64,
    pub query_failures: u64,
    pub records_rejected: u64,
}

/// 进程级写入 / 查询计数器。
pub struct TelemetryMetrics {
    records_written: AtomicU64,
    write_failures: AtomicU64,
    points_submitted: AtomicU64,
    flushes: AtomicU64,
    flush_latency_ms_total: AtomicU64,
    flush_latency_ms_count: AtomicU64,
    queries_executed: AtomicU64,
    query_failures: AtomicU64,
    records_rejected: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            points_submitted: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            flush_latency_ms_total: AtomicU64::new(0),
            flush_latency_ms_count: AtomicU64::new(0),
            queries_executed: AtomicU64::new(0),
            query_failures: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            points_submitted: self.points_submitted.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            flush_latency_ms_total: self.flush_latency_ms_total.load(Ordering::Relaxed),
            flush_latency_ms_count: self.flush_latency_ms_count.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            query_failures: self.query_failures.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info，可用 RUST_LOG 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录一次成功写入的记录。
pub fn record_record_written() {
    metrics().records_written.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入失败次数。
pub fn record_write_failure() {
    metrics().write_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录提交到写缓冲区的点数。
pub fn record_points_submitted(count: u64) {
    metrics()
        .points_submitted
        .fetch_add(count, Ordering::Relaxed);
}

/// 记录一次显式刷新及其耗时（毫秒）。
pub fn record_flush_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics.flushes.fetch_add(1, Ordering::Relaxed);
    metrics
        .flush_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .flush_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录查询执行次数。
pub fn record_query_executed() {
    metrics().queries_executed.fetch_add(1, Ordering::Relaxed);
}

/// 记录查询失败次数。
pub fn record_query_failure() {
    metrics().query_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录无法解码而被丢弃的输入记录。
pub fn record_record_rejected() {
    metrics().records_rejected.fetch_add(1, Ordering::Relaxed);
}
