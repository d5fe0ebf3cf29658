//! InfluxDB v2 HTTP 实现
//!
//! - [`client`]：客户端工厂与句柄（/ping）
//! - [`write`]：缓冲写入（/api/v2/write）
//! - [`query`]：Flux 查询（/api/v2/query）
//! - [`line_protocol`]：Point 编码

pub mod client;
pub mod line_protocol;
pub mod query;
pub mod write;

pub use client::{InfluxConnector, InfluxHandle};
pub use query::InfluxQueryApi;
pub use write::InfluxWriteApi;
