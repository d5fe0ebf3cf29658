//! 按阶段路由到 measurement

use domain::Stage;
use std::fmt;

/// 目标 measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// 原始数据
    Original,
    /// 处理后数据
    Processed,
}

impl Measurement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Original => "Original",
            Measurement::Processed => "Processed",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 阶段对应的 measurement 列表；未声明或无法识别的阶段双写
pub fn targets(stage: &Stage) -> &'static [Measurement] {
    match stage {
        Stage::Pre => &[Measurement::Original],
        Stage::Post => &[Measurement::Processed],
        Stage::Unspecified | Stage::Other(_) => &[Measurement::Original, Measurement::Processed],
    }
}
