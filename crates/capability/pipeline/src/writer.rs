use crate::routing::{Measurement, targets};
use crate::tags::TagSet;
use async_trait::async_trait;
use domain::{Record, Stage};
use forwarder_storage::{ConnectionManager, Point, StorageError};
use forwarder_telemetry as telemetry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 单条记录的写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub stage: Stage,
    pub measurements: Vec<Measurement>,
}

/// 记录写入器抽象。
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn write(&self, record: &Record) -> Result<WriteResult, StorageError>;

    async fn write_batch(&self, records: &[Record]) -> Result<Vec<WriteResult>, StorageError> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.write(record).await?);
        }
        Ok(results)
    }
}

/// 打标签并按阶段路由的写入器
///
/// 不持有自己的句柄，每次写入都从 ConnectionManager 取当前连接的写入句柄。
#[derive(Clone)]
pub struct TagRouteWriter {
    connection: Arc<ConnectionManager>,
}

impl TagRouteWriter {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }

    async fn submit(&self, record: &Record) -> Result<WriteResult, StorageError> {
        let write_api = self.connection.write_api().await?;
        let tags = TagSet::from_record(record).into_map();
        let measurements = targets(&record.stage);

        for measurement in measurements {
            let point = Point::new(
                measurement.as_str(),
                tags.clone(),
                record.fields.clone(),
                record.timestamp,
            );
            write_api
                .write_point(point)
                .await
                .map_err(StorageError::Write)?;
        }
        telemetry::record_points_submitted(measurements.len() as u64);
        log_record(record);

        let started = Instant::now();
        write_api.flush().await.map_err(StorageError::Write)?;
        telemetry::record_flush_latency_ms(started.elapsed().as_millis() as u64);

        Ok(WriteResult {
            stage: record.stage.clone(),
            measurements: measurements.to_vec(),
        })
    }
}

#[async_trait]
impl RecordWriter for TagRouteWriter {
    async fn write(&self, record: &Record) -> Result<WriteResult, StorageError> {
        match self.submit(record).await {
            Ok(result) => {
                telemetry::record_record_written();
                Ok(result)
            }
            Err(err) => {
                telemetry::record_write_failure();
                Err(err)
            }
        }
    }
}

/// 原始记录值拼接的日志行
pub fn log_line(record: &Record) -> String {
    [
        record.gateway.as_str(),
        record.customer_name.as_str(),
        record.site_name.as_str(),
        record.controller.as_str(),
        record.controller_identifier.as_str(),
        record.device_type.as_str(),
        record.device_identifier.as_str(),
        record.device_name.as_str(),
    ]
    .join(" :: ")
}

fn log_record(record: &Record) {
    let line = log_line(record);
    if record.stage != Stage::Pre {
        info!("{}", line);
    }
    let label = record.stage.label();
    if label.is_empty() {
        debug!(data = ?record.fields, "{}", line);
    } else {
        debug!(data = ?record.fields, "{} :: {}", line, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_keeps_raw_order_and_empties() {
        let record = Record {
            gateway: "gw1".to_string(),
            customer_name: "Acme".to_string(),
            controller: "ctl".to_string(),
            controller_identifier: "C-1".to_string(),
            device_type: "meter".to_string(),
            device_identifier: "D-9".to_string(),
            device_name: "main".to_string(),
            ..Record::default()
        };
        assert_eq!(
            log_line(&record),
            "gw1 :: Acme ::  :: ctl :: C-1 :: meter :: D-9 :: main"
        );
    }
}
