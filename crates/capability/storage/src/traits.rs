//! 时序库协作接口 Trait 定义
//!
//! 连接管理器只通过以下接口访问底层客户端：
//! - TsdbConnector：按端点与令牌创建客户端句柄
//! - TsdbHandle：存活检查、派生写入 / 查询句柄、关闭
//! - WriteApi：缓冲写入与显式刷新
//! - QueryApi：执行查询文本
//!
//! 设计原则：
//! - 接口返回 TransportError，由调用方补充操作上下文
//! - 使用 async_trait 支持动态分发

use crate::error::TransportError;
use crate::models::{ClientOptions, Point, QueryResult};
use async_trait::async_trait;
use std::sync::Arc;

/// 客户端工厂
pub trait TsdbConnector: Send + Sync {
    /// 创建客户端句柄（不做网络 I/O）
    fn connect(
        &self,
        url: &str,
        token: &str,
        options: &ClientOptions,
    ) -> Result<Arc<dyn TsdbHandle>, TransportError>;
}

/// 已创建的客户端句柄
#[async_trait]
pub trait TsdbHandle: Send + Sync {
    /// 存活检查
    async fn ping(&self) -> Result<bool, TransportError>;

    /// 派生指定组织与 bucket 的写入句柄
    fn write_api(&self, org: &str, bucket: &str) -> Arc<dyn WriteApi>;

    /// 派生指定组织的查询句柄
    fn query_api(&self, org: &str) -> Arc<dyn QueryApi>;

    /// 关闭客户端（投递缓冲区中剩余的点）
    async fn close(&self);
}

/// 缓冲写入句柄
#[async_trait]
pub trait WriteApi: Send + Sync {
    /// 提交一个点到缓冲区
    async fn write_point(&self, point: Point) -> Result<(), TransportError>;

    /// 将缓冲区交给投递端
    async fn flush(&self) -> Result<(), TransportError>;
}

/// 查询句柄
#[async_trait]
pub trait QueryApi: Send + Sync {
    async fn query(&self, query: &str) -> Result<QueryResult, TransportError>;
}
