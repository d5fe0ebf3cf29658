//! 内存存储实现模块
//!
//! 仅用于测试和 dry-run。
//!
//! 包含以下实现：
//! - TsdbConnector / TsdbHandle / WriteApi / QueryApi: InMemoryTsdb

pub mod tsdb;

pub use tsdb::*;
