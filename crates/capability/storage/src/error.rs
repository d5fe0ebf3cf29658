//! 存储层错误类型
//!
//! 分两层：
//! - TransportError：时序库客户端（HTTP / 内存实现）返回的底层错误
//! - StorageError：连接管理与读写路径对外暴露的错误，附带失败的操作上下文

use std::fmt;

/// 时序库客户端错误
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ping not acknowledged by server")]
    PingRejected,

    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("write buffer overflow: dropped {0} lines")]
    BufferOverflow(usize),

    #[error("rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// 是否值得重试：传输层错误、限流与服务端错误。
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Http(_) => true,
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// 未初始化的句柄类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Write,
    Query,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Write => f.write_str("writeAPI"),
            Handle::Query => f.write_str("queryAPI"),
        }
    }
}

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 建连失败（创建客户端、ping、校验查询），状态已回滚为 Disconnected
    #[error("failed to {operation} InfluxDB server: {source}")]
    Connection {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// 未建立连接时访问写入 / 查询句柄
    #[error("{0} is not initialized")]
    Uninitialized(Handle),

    #[error("failed to execute query: {0}")]
    QueryExecution(#[source] TransportError),

    #[error("failed to write points: {0}")]
    Write(#[source] TransportError),
}
