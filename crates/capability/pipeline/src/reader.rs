use async_trait::async_trait;
use domain::Record;
use forwarder_storage::{ConnectionManager, StorageError};
use forwarder_telemetry as telemetry;
use std::sync::Arc;
use tracing::debug;

/// 记录查询抽象。
#[async_trait]
pub trait RecordQuery: Send + Sync {
    async fn query(&self, query: &str) -> Result<Vec<Record>, StorageError>;
}

/// 读取路径
///
/// 查询成功时返回空列表：结果只统计行数后即释放，按行还原为 Record 留作扩展点。
#[derive(Clone)]
pub struct RecordReader {
    connection: Arc<ConnectionManager>,
}

impl RecordReader {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl RecordQuery for RecordReader {
    async fn query(&self, query: &str) -> Result<Vec<Record>, StorageError> {
        let query_api = self.connection.query_api().await?;
        let result = match query_api.query(query).await {
            Ok(result) => result,
            Err(err) => {
                telemetry::record_query_failure();
                return Err(StorageError::QueryExecution(err));
            }
        };
        telemetry::record_query_executed();
        debug!(rows = result.row_count(), "query executed");
        result.close();
        Ok(Vec::new())
    }
}
