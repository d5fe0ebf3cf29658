//! # Forwarder Storage 模块
//!
//! 时序库访问层：管理到 InfluxDB 的单一连接，并向写入 / 读取路径提供
//! 缓冲写入句柄与查询句柄。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：客户端工厂、句柄、写入与查询的异步 Trait
//! 2. **数据模型层** (`models.rs`)：连接配置、客户端参数、Point、QueryResult
//! 3. **错误处理层** (`error.rs`)：TransportError 与 StorageError
//! 4. **连接管理层** (`connection.rs`)：ConnectionManager 生命周期
//! 5. **实现层**：
//!    - `influx/`：InfluxDB v2 HTTP 实现（生产环境使用）
//!    - `in_memory/`：内存实现（测试与 dry-run）
//!
//! ## 连接生命周期
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ping + buckets()──▶ Connected
//!      ▲                        │ 失败回滚                        │
//!      └────────────────────────┴──────────── disconnect ─────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use forwarder_storage::{ClientOptions, ConnectionManager, InfluxConfig, InfluxConnector};
//! use std::sync::Arc;
//!
//! let manager = ConnectionManager::new(
//!     InfluxConfig::new("http://localhost:8086", "token", "org", "telemetry"),
//!     ClientOptions::default(),
//!     Arc::new(InfluxConnector),
//! );
//! manager.connect().await?;
//! let write_api = manager.write_api().await?;
//! ```
//!
//! ## 缓冲写入
//!
//! - 点编码为 line protocol 后进入缓冲区
//! - 达到 `batch_size`、显式 `flush` 或 `flush_interval` 到期时投递
//! - 传输错误、429 与 5xx 按 `retry_interval` 重试至多 `max_retries` 次

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod influx;
pub mod models;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use traits::*;

pub use in_memory::InMemoryTsdb;
pub use influx::{InfluxConnector, InfluxHandle, InfluxQueryApi, InfluxWriteApi};
