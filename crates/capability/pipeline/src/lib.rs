//! # Forwarder Pipeline 模块
//!
//! 写入路径：记录 → 标签集（缺失元数据补占位值）→ 按阶段选定 measurement →
//! 提交到缓冲写入句柄并刷新。
//!
//! | 阶段 | measurement | 日志 |
//! |------|-------------|------|
//! | Pre | Original | debug |
//! | Post | Processed | info + debug |
//! | 未声明 | Original + Processed | info + debug |
//!
//! 读取路径：执行查询文本，成功时返回空列表。

pub mod reader;
pub mod routing;
pub mod tags;
pub mod writer;

pub use reader::{RecordQuery, RecordReader};
pub use routing::{Measurement, targets};
pub use tags::TagSet;
pub use writer::{RecordWriter, TagRouteWriter, WriteResult, log_line};
