//! 时序库内存实现
//!
//! 用于测试与 dry-run：记录建连 / 关闭 / 刷新次数、投递的点与执行过的查询，
//! 并可按需注入建连、ping、查询、刷新失败。

use crate::error::TransportError;
use crate::models::{ClientOptions, Point, QueryResult};
use crate::traits::{QueryApi, TsdbConnector, TsdbHandle, WriteApi};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PingBehavior {
    #[default]
    Healthy,
    NotAcknowledged,
    Unreachable,
}

#[derive(Debug, Default)]
struct Failures {
    connect: Option<String>,
    ping: PingBehavior,
    queries: Vec<String>,
    flush: Option<String>,
}

#[derive(Default)]
struct InMemoryState {
    connections: AtomicUsize,
    closes: AtomicUsize,
    flushes: AtomicUsize,
    failures: RwLock<Failures>,
    pending: RwLock<Vec<Point>>,
    points: RwLock<Vec<Point>>,
    queries: RwLock<Vec<String>>,
    write_target: RwLock<Option<(String, String)>>,
}

impl InMemoryState {
    fn failures<T>(&self, read: impl FnOnce(&Failures) -> T) -> Option<T> {
        self.failures.read().ok().map(|failures| read(&*failures))
    }

    /// 按注入的刷新失败投递待发送的点
    fn flush_pending(&self) -> Result<usize, TransportError> {
        if let Some(Some(message)) = self.failures(|failures| failures.flush.clone()) {
            return Err(TransportError::Rejected(message));
        }
        self.deliver_pending()
    }

    fn deliver_pending(&self) -> Result<usize, TransportError> {
        let mut pending = self
            .pending
            .write()
            .map_err(|_| TransportError::Rejected("lock failed".to_string()))?;
        let mut points = self
            .points
            .write()
            .map_err(|_| TransportError::Rejected("lock failed".to_string()))?;
        let count = pending.len();
        points.append(&mut pending);
        Ok(count)
    }
}

/// 内存时序库（同时充当客户端工厂）
#[derive(Clone, Default)]
pub struct InMemoryTsdb {
    state: Arc<InMemoryState>,
}

impl InMemoryTsdb {
    pub fn new() -> Self {
        Self::default()
    }

    /// 后续建连直接失败
    pub fn fail_connect(&self, message: impl Into<String>) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.connect = Some(message.into());
        }
    }

    /// ping 返回 false
    pub fn reject_ping(&self) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.ping = PingBehavior::NotAcknowledged;
        }
    }

    /// ping 返回错误
    pub fn fail_ping(&self) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.ping = PingBehavior::Unreachable;
        }
    }

    /// 恢复健康的 ping
    pub fn heal_ping(&self) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.ping = PingBehavior::Healthy;
        }
    }

    /// 指定查询文本执行失败
    pub fn fail_query(&self, query: impl Into<String>) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.queries.push(query.into());
        }
    }

    /// 后续刷新失败
    pub fn fail_flush(&self, message: impl Into<String>) {
        if let Ok(mut failures) = self.state.failures.write() {
            failures.flush = Some(message.into());
        }
    }

    /// 已创建的客户端数量
    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// 已关闭的客户端数量
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// 成功刷新的次数
    pub fn flush_count(&self) -> usize {
        self.state.flushes.load(Ordering::SeqCst)
    }

    /// 已投递的点
    pub fn points(&self) -> Vec<Point> {
        self.state
            .points
            .read()
            .map(|points| points.clone())
            .unwrap_or_default()
    }

    /// 已提交但尚未投递的点
    pub fn pending_points(&self) -> Vec<Point> {
        self.state
            .pending
            .read()
            .map(|points| points.clone())
            .unwrap_or_default()
    }

    /// 执行过的查询文本（含建连校验查询）
    pub fn queries(&self) -> Vec<String> {
        self.state
            .queries
            .read()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    /// 最近一次派生写入句柄时的 (org, bucket)
    pub fn write_target(&self) -> Option<(String, String)> {
        self.state
            .write_target
            .read()
            .ok()
            .and_then(|target| target.clone())
    }
}

impl TsdbConnector for InMemoryTsdb {
    fn connect(
        &self,
        _url: &str,
        _token: &str,
        _options: &ClientOptions,
    ) -> Result<Arc<dyn TsdbHandle>, TransportError> {
        if let Some(Some(message)) = self.state.failures(|failures| failures.connect.clone()) {
            return Err(TransportError::Rejected(message));
        }
        self.state.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryHandle {
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemoryHandle {
    state: Arc<InMemoryState>,
}

#[async_trait]
impl TsdbHandle for InMemoryHandle {
    async fn ping(&self) -> Result<bool, TransportError> {
        match self.state.failures(|failures| failures.ping).unwrap_or_default() {
            PingBehavior::Healthy => Ok(true),
            PingBehavior::NotAcknowledged => Ok(false),
            PingBehavior::Unreachable => {
                Err(TransportError::Rejected("connection refused".to_string()))
            }
        }
    }

    fn write_api(&self, org: &str, bucket: &str) -> Arc<dyn WriteApi> {
        if let Ok(mut target) = self.state.write_target.write() {
            *target = Some((org.to_string(), bucket.to_string()));
        }
        Arc::new(InMemoryWriteApi {
            state: Arc::clone(&self.state),
        })
    }

    fn query_api(&self, _org: &str) -> Arc<dyn QueryApi> {
        Arc::new(InMemoryQueryApi {
            state: Arc::clone(&self.state),
        })
    }

    async fn close(&self) {
        if let Err(err) = self.state.flush_pending() {
            warn!(error = %err, "final flush on close failed");
        }
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct InMemoryWriteApi {
    state: Arc<InMemoryState>,
}

#[async_trait]
impl WriteApi for InMemoryWriteApi {
    async fn write_point(&self, point: Point) -> Result<(), TransportError> {
        let mut pending = self
            .state
            .pending
            .write()
            .map_err(|_| TransportError::Rejected("lock failed".to_string()))?;
        pending.push(point);
        Ok(())
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.state.flush_pending()?;
        self.state.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct InMemoryQueryApi {
    state: Arc<InMemoryState>,
}

#[async_trait]
impl QueryApi for InMemoryQueryApi {
    async fn query(&self, query: &str) -> Result<QueryResult, TransportError> {
        if let Ok(mut queries) = self.state.queries.write() {
            queries.push(query.to_string());
        }
        let rejected = self
            .state
            .failures(|failures| failures.queries.iter().any(|q| q == query))
            .unwrap_or(false);
        if rejected {
            return Err(TransportError::Status {
                status: 400,
                body: format!("compilation failed: {}", query),
            });
        }
        Ok(QueryResult::default())
    }
}
