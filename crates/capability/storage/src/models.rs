//! 存储层数据结构
//!
//! - InfluxConfig：连接所需的端点、令牌、组织与目标 bucket
//! - ClientOptions：缓冲写入与传输参数
//! - Point：不可变的写入单元
//! - QueryResult：查询返回的原始结果

use chrono::{DateTime, Utc};
use domain::Fields;
use std::collections::BTreeMap;
use std::time::Duration;

/// 时序库连接配置（全部必填）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl InfluxConfig {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
        }
    }
}

/// 客户端构造参数
///
/// 在建连时交给客户端实现：
/// - batch_size：缓冲达到该行数时自动投递
/// - flush_interval：后台定时投递周期，0 表示关闭
/// - retry_interval / max_retries：可重试错误的重试间隔与次数
/// - max_buffer_lines：投递失败回灌缓冲区的上限
/// - request_timeout：单次 HTTP 请求超时
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub max_buffer_lines: usize,
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            batch_size: 3,
            flush_interval: Duration::from_millis(10_000),
            retry_interval: Duration::from_millis(5_000),
            max_retries: 3,
            max_buffer_lines: 10_000,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

/// 写入单元：measurement + 标签 + 字段 + 时间戳
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: Fields,
    timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            fields,
            timestamp,
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 查询返回的原始结果（annotated CSV）
///
/// 仅暴露行数；按行还原为 Record 尚未实现。值在作用域结束时释放。
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    body: String,
}

impl QueryResult {
    pub fn from_csv(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// 原始响应体
    pub fn raw(&self) -> &str {
        &self.body
    }

    /// 数据行数（跳过注解行、空行与每张表的表头）
    pub fn row_count(&self) -> usize {
        let mut expect_header = true;
        let mut rows = 0;
        for line in self.body.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                expect_header = true;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if expect_header {
                expect_header = false;
                continue;
            }
            rows += 1;
        }
        rows
    }

    /// 显式释放结果
    pub fn close(self) {}
}
