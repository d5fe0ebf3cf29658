//! InfluxDB 缓冲写入
//!
//! 点先编码为 line protocol 放入缓冲区，满 batch_size 或显式 flush 时投递到
//! `/api/v2/write`。可重试错误按 retry_interval 重试 max_retries 次，仍失败的
//! 批次回灌到缓冲区头部，超过 max_buffer_lines 则丢弃；不可重试的错误直接丢弃批次。
//!
//! write_point 只负责入缓冲：自动投递失败时告警，被丢弃批次的错误留到下一次
//! 显式 flush 返回。

use crate::error::TransportError;
use crate::influx::line_protocol;
use crate::models::{ClientOptions, Point};
use crate::traits::WriteApi;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub(crate) struct WriteInner {
    http: reqwest::Client,
    url: Url,
    authorization: String,
    options: ClientOptions,
    buffer: Mutex<Vec<String>>,
    // 串行化投递，保证回灌后的顺序
    delivery: Mutex<()>,
    // 自动投递中被丢弃批次的错误，由下一次显式 flush 返回
    deferred: Mutex<Option<TransportError>>,
}

impl WriteInner {
    async fn flush(&self) -> Result<(), TransportError> {
        let _delivery = self.delivery.lock().await;
        let batch = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        if batch.is_empty() {
            return Ok(());
        }

        match self.send_with_retry(&batch).await {
            Ok(()) => {
                debug!(lines = batch.len(), "write batch delivered");
                Ok(())
            }
            Err(err) if !err.is_retryable() => {
                warn!(
                    dropped = batch.len(),
                    error = %err,
                    "write batch rejected, dropping"
                );
                Err(err)
            }
            Err(err) => {
                let mut buffer = self.buffer.lock().await;
                if buffer.len() + batch.len() > self.options.max_buffer_lines {
                    warn!(
                        dropped = batch.len(),
                        error = %err,
                        "write buffer full, dropping failed batch"
                    );
                    return Err(TransportError::BufferOverflow(batch.len()));
                }
                let mut restored = batch;
                restored.append(&mut buffer);
                *buffer = restored;
                Err(err)
            }
        }
    }

    async fn send_with_retry(&self, batch: &[String]) -> Result<(), TransportError> {
        let body = batch.join("\n");
        let mut attempt = 0u32;
        loop {
            match self.send(body.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt < self.options.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.options.max_retries,
                        error = %err,
                        "write batch failed, retrying"
                    );
                    tokio::time::sleep(self.options.retry_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(&self, body: String) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url.clone())
            .header(AUTHORIZATION, self.authorization.as_str())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// InfluxDB 写入句柄
pub struct InfluxWriteApi {
    inner: Arc<WriteInner>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
}

impl InfluxWriteApi {
    pub(crate) fn new(
        http: reqwest::Client,
        url: Url,
        authorization: String,
        options: ClientOptions,
    ) -> Self {
        let inner = Arc::new(WriteInner {
            http,
            url,
            authorization,
            options,
            buffer: Mutex::new(Vec::new()),
            delivery: Mutex::new(()),
            deferred: Mutex::new(None),
        });
        let ticker = spawn_ticker(&inner);
        Self {
            inner,
            ticker: StdMutex::new(ticker),
        }
    }

    /// 当前缓冲的行数
    pub async fn pending(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }

    /// 停止定时刷新并投递剩余的点
    pub(crate) async fn close(&self) {
        self.stop_ticker();
        if let Err(err) = self.inner.flush().await {
            warn!(error = %err, "final flush on close failed");
        }
    }

    fn stop_ticker(&self) {
        let ticker = match self.ticker.lock() {
            Ok(mut ticker) => ticker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }
}

impl Drop for InfluxWriteApi {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// 在当前 tokio 运行时中按 flush_interval 定时投递；不在运行时内或间隔为 0 时不启动
fn spawn_ticker(inner: &Arc<WriteInner>) -> Option<JoinHandle<()>> {
    let period = inner.options.flush_interval;
    if period.is_zero() {
        return None;
    }
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let weak = Arc::downgrade(inner);
    Some(runtime.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // 第一次 tick 立即返回
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            if let Err(err) = inner.flush().await {
                warn!(error = %err, "periodic flush failed");
            }
        }
    }))
}

#[async_trait]
impl WriteApi for InfluxWriteApi {
    async fn write_point(&self, point: Point) -> Result<(), TransportError> {
        let line = line_protocol::encode(&point)?;
        let should_flush = {
            let mut buffer = self.inner.buffer.lock().await;
            if buffer.len() >= self.inner.options.max_buffer_lines {
                return Err(TransportError::BufferOverflow(1));
            }
            buffer.push(line);
            buffer.len() >= self.inner.options.batch_size
        };
        if should_flush {
            if let Err(err) = self.inner.flush().await {
                warn!(error = %err, "batch flush failed");
                // 回灌的批次会随下一次投递重发，只记录已丢弃的
                if !err.is_retryable() {
                    *self.inner.deferred.lock().await = Some(err);
                }
            }
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.inner.flush().await?;
        match self.inner.deferred.lock().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
