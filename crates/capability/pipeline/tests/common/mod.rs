//! 测试辅助：捕获 tracing 输出。

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// 在当前线程安装 DEBUG 级别的捕获订阅器
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let buffer = Arc::clone(&self.buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(move || CaptureWriter(Arc::clone(&buffer)))
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|err| err.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// 指定级别且包含 message 的日志行数
    pub fn count(&self, level: &str, message: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.trim_start().starts_with(level) && line.contains(message))
            .count()
    }
}
