//! InfluxDB Flux 查询

use crate::error::TransportError;
use crate::models::QueryResult;
use crate::traits::QueryApi;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// InfluxDB 查询句柄
pub struct InfluxQueryApi {
    http: reqwest::Client,
    url: Url,
    authorization: String,
}

impl InfluxQueryApi {
    pub(crate) fn new(http: reqwest::Client, url: Url, authorization: String) -> Self {
        Self {
            http,
            url,
            authorization,
        }
    }
}

#[async_trait]
impl QueryApi for InfluxQueryApi {
    async fn query(&self, query: &str) -> Result<QueryResult, TransportError> {
        let response = self
            .http
            .post(self.url.clone())
            .header(AUTHORIZATION, self.authorization.as_str())
            .header(ACCEPT, "application/csv")
            .json(&QueryRequest {
                query,
                kind: "flux",
            })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        Ok(QueryResult::from_csv(body))
    }
}
