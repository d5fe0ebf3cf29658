//! InfluxDB v2 HTTP 客户端
//!
//! InfluxConnector 只校验端点并构造 reqwest 客户端，不做网络 I/O；
//! 存活检查与查询由 ConnectionManager 在建连时显式执行。

use crate::error::TransportError;
use crate::influx::query::InfluxQueryApi;
use crate::influx::write::InfluxWriteApi;
use crate::models::ClientOptions;
use crate::traits::{QueryApi, TsdbConnector, TsdbHandle, WriteApi};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::{Arc, Mutex};

/// InfluxDB 客户端工厂
#[derive(Debug, Clone, Copy, Default)]
pub struct InfluxConnector;

impl TsdbConnector for InfluxConnector {
    fn connect(
        &self,
        url: &str,
        token: &str,
        options: &ClientOptions,
    ) -> Result<Arc<dyn TsdbHandle>, TransportError> {
        let handle = InfluxHandle::new(url, token, options.clone())?;
        Ok(Arc::new(handle))
    }
}

/// InfluxDB 客户端句柄
pub struct InfluxHandle {
    base_url: Url,
    authorization: String,
    http: reqwest::Client,
    options: ClientOptions,
    writers: Mutex<Vec<Arc<InfluxWriteApi>>>,
}

impl InfluxHandle {
    pub fn new(url: &str, token: &str, options: ClientOptions) -> Result<Self, TransportError> {
        let parsed =
            Url::parse(url).map_err(|err| TransportError::InvalidUrl(format!("{url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            base_url: parsed,
            authorization: format!("Token {}", token),
            http,
            options,
            writers: Mutex::new(Vec::new()),
        })
    }

    /// 在基础地址路径后追加 API 路径，支持部署在子路径下的实例
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    fn take_writers(&self) -> Vec<Arc<InfluxWriteApi>> {
        match self.writers.lock() {
            Ok(mut writers) => std::mem::take(&mut *writers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl TsdbHandle for InfluxHandle {
    async fn ping(&self) -> Result<bool, TransportError> {
        let response = self
            .http
            .get(self.endpoint("/ping", &[]))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    fn write_api(&self, org: &str, bucket: &str) -> Arc<dyn WriteApi> {
        let url = self.endpoint(
            "/api/v2/write",
            &[("org", org), ("bucket", bucket), ("precision", "ns")],
        );
        let writer = Arc::new(InfluxWriteApi::new(
            self.http.clone(),
            url,
            self.authorization.clone(),
            self.options.clone(),
        ));
        match self.writers.lock() {
            Ok(mut writers) => writers.push(Arc::clone(&writer)),
            Err(poisoned) => poisoned.into_inner().push(Arc::clone(&writer)),
        }
        writer
    }

    fn query_api(&self, org: &str) -> Arc<dyn QueryApi> {
        let url = self.endpoint("/api/v2/query", &[("org", org)]);
        Arc::new(InfluxQueryApi::new(
            self.http.clone(),
            url,
            self.authorization.clone(),
        ))
    }

    async fn close(&self) {
        for writer in self.take_writers() {
            writer.close().await;
        }
    }
}
