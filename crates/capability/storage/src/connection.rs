//! 时序库连接管理
//!
//! ConnectionManager 独占一个客户端连接及其派生的写入 / 查询句柄：
//! - connect：创建客户端 → ping → 校验查询，任一步失败即回滚为 Disconnected
//! - disconnect：关闭客户端并清空句柄
//! - is_connected：无阻塞读取当前状态
//!
//! 已连接时再次 connect、未连接时 disconnect 均为告警级空操作。

use crate::error::{Handle, StorageError, TransportError};
use crate::models::{ClientOptions, InfluxConfig};
use crate::traits::{QueryApi, TsdbConnector, TsdbHandle, WriteApi};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 建连时执行的校验查询
pub const VALIDATION_QUERY: &str = "buckets()";

/// 连接生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

struct Connection {
    handle: Arc<dyn TsdbHandle>,
    write_api: Arc<dyn WriteApi>,
    query_api: Arc<dyn QueryApi>,
}

/// 建连被取消或失败时把状态复位为 Disconnected
struct ConnectingGuard<'a> {
    state: &'a AtomicU8,
    armed: bool,
}

impl<'a> ConnectingGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        state.store(ConnectionState::Connecting.as_u8(), Ordering::Release);
        Self { state, armed: true }
    }

    fn commit(mut self) {
        self.armed = false;
        self.state
            .store(ConnectionState::Connected.as_u8(), Ordering::Release);
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .store(ConnectionState::Disconnected.as_u8(), Ordering::Release);
        }
    }
}

/// 单连接管理器
///
/// 生命周期方法内部串行化；写入与查询可并发调用。
pub struct ConnectionManager {
    config: InfluxConfig,
    options: ClientOptions,
    connector: Arc<dyn TsdbConnector>,
    state: AtomicU8,
    connection: RwLock<Option<Connection>>,
}

impl ConnectionManager {
    /// 创建未连接的管理器
    pub fn new(
        config: InfluxConfig,
        options: ClientOptions,
        connector: Arc<dyn TsdbConnector>,
    ) -> Self {
        Self {
            config,
            options,
            connector,
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            connection: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// 当前生命周期状态
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// 建立连接并校验可达、可查询
    pub async fn connect(&self) -> Result<(), StorageError> {
        info!(
            url = %self.config.url,
            org = %self.config.org,
            bucket = %self.config.bucket,
            "Connecting to InfluxDB"
        );

        let mut slot = self.connection.write().await;
        if slot.is_some() {
            warn!("InfluxDB client already connected");
            return Ok(());
        }

        let guard = ConnectingGuard::new(&self.state);
        match self.establish().await {
            Ok(connection) => {
                *slot = Some(connection);
                guard.commit();
                info!("Connected to InfluxDB");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "InfluxDB connection failed");
                Err(err)
            }
        }
    }

    async fn establish(&self) -> Result<Connection, StorageError> {
        let handle = self
            .connector
            .connect(&self.config.url, &self.config.token, &self.options)
            .map_err(|source| StorageError::Connection {
                operation: "connect to",
                source,
            })?;
        let query_api = handle.query_api(&self.config.org);
        let write_api = handle.write_api(&self.config.org, &self.config.bucket);

        let ping = match handle.ping().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::PingRejected),
            Err(err) => Err(err),
        };
        if let Err(source) = ping {
            handle.close().await;
            return Err(StorageError::Connection {
                operation: "ping",
                source,
            });
        }
        debug!("Successfully pinged InfluxDB server");

        if let Err(source) = query_api.query(VALIDATION_QUERY).await {
            handle.close().await;
            return Err(StorageError::Connection {
                operation: "query",
                source,
            });
        }

        Ok(Connection {
            handle,
            write_api,
            query_api,
        })
    }

    /// 断开连接；未连接时仅告警
    pub async fn disconnect(&self) {
        let mut slot = self.connection.write().await;
        let Some(connection) = slot.take() else {
            warn!("No connection to InfluxDB");
            return;
        };
        self.state
            .store(ConnectionState::Disconnected.as_u8(), Ordering::Release);

        connection.handle.close().await;
        info!("Disconnected from InfluxDB");
    }

    /// 当前连接的写入句柄
    pub async fn write_api(&self) -> Result<Arc<dyn WriteApi>, StorageError> {
        let slot = self.connection.read().await;
        slot.as_ref()
            .map(|connection| Arc::clone(&connection.write_api))
            .ok_or(StorageError::Uninitialized(Handle::Write))
    }

    /// 当前连接的查询句柄
    pub async fn query_api(&self) -> Result<Arc<dyn QueryApi>, StorageError> {
        let slot = self.connection.read().await;
        slot.as_ref()
            .map(|connection| Arc::clone(&connection.query_api))
            .ok_or(StorageError::Uninitialized(Handle::Query))
    }
}
