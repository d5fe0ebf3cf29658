//! 转发进程运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 转发进程运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub influx_url: String,
    pub influx_token: String,
    pub influx_org: String,
    pub influx_bucket: String,
    pub write_batch_size: usize,
    pub write_flush_interval_ms: u64,
    pub write_retry_interval_ms: u64,
    pub write_max_retries: u32,
    pub write_max_buffer_lines: usize,
    pub http_timeout_ms: u64,
    pub dry_run: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let influx_url = read_required("FORWARDER_INFLUX_URL")?;
        let influx_token = read_required("FORWARDER_INFLUX_TOKEN")?;
        let influx_org = read_required("FORWARDER_INFLUX_ORG")?;
        let influx_bucket = read_required("FORWARDER_INFLUX_BUCKET")?;
        let write_batch_size = read_usize_with_default("FORWARDER_WRITE_BATCH_SIZE", 3)?;
        if write_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "FORWARDER_WRITE_BATCH_SIZE".to_string(),
                "0".to_string(),
            ));
        }
        let write_flush_interval_ms =
            read_u64_with_default("FORWARDER_WRITE_FLUSH_INTERVAL_MS", 10_000)?;
        let write_retry_interval_ms =
            read_u64_with_default("FORWARDER_WRITE_RETRY_INTERVAL_MS", 5_000)?;
        let write_max_retries = read_u32_with_default("FORWARDER_WRITE_MAX_RETRIES", 3)?;
        let write_max_buffer_lines =
            read_usize_with_default("FORWARDER_WRITE_MAX_BUFFER_LINES", 10_000)?;
        let http_timeout_ms = read_u64_with_default("FORWARDER_HTTP_TIMEOUT_MS", 10_000)?;
        let dry_run = read_bool_with_default("FORWARDER_DRY_RUN", false);

        Ok(Self {
            influx_url,
            influx_token,
            influx_org,
            influx_bucket,
            write_batch_size,
            write_flush_interval_ms,
            write_retry_interval_ms,
            write_max_retries,
            write_max_buffer_lines,
            http_timeout_ms,
            dry_run,
        })
    }
}

/// 读取必填项，空串视为缺失。
fn read_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
