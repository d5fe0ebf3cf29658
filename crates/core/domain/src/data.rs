use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// 记录所处的处理阶段，决定写入哪个 measurement。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Stage {
    /// 原始采集数据。
    Pre,
    /// 流水线处理后的数据。
    Post,
    /// 未声明阶段（缺失、null 或空串）。
    #[default]
    Unspecified,
    /// 无法识别的阶段标记，保留原始取值。
    Other(String),
}

impl Stage {
    /// 解析阶段标记；空串视为未声明，其余未知取值原样保留。
    pub fn parse(value: &str) -> Self {
        match value {
            "Pre" => Stage::Pre,
            "Post" => Stage::Post,
            "" => Stage::Unspecified,
            other => Stage::Other(other.to_string()),
        }
    }

    /// 阶段标签，未声明时为空串。
    pub fn label(&self) -> &str {
        match self {
            Stage::Pre => "Pre",
            Stage::Post => "Post",
            Stage::Unspecified => "",
            Stage::Other(label) => label,
        }
    }
}

impl From<String> for Stage {
    fn from(value: String) -> Self {
        Stage::parse(&value)
    }
}

impl From<Option<String>> for Stage {
    fn from(value: Option<String>) -> Self {
        value.map(Stage::from).unwrap_or_default()
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.label().to_string()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 字段值（测量负载中的标量）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

/// 字段名 → 字段值，按名称有序。
pub type Fields = BTreeMap<String, FieldValue>;

/// 待持久化的遥测记录。
///
/// 元数据缺失时保持空串 / nil UUID，由写入端统一替换为占位标签。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub stage: Stage,
    #[serde(rename = "customerID", default)]
    pub customer_id: Uuid,
    #[serde(rename = "customerName", default)]
    pub customer_name: String,
    #[serde(rename = "siteID", default)]
    pub site_id: Uuid,
    #[serde(rename = "siteName", default)]
    pub site_name: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default)]
    pub controller: String,
    #[serde(rename = "deviceType", default)]
    pub device_type: String,
    #[serde(rename = "controllerIdentifier", default)]
    pub controller_identifier: String,
    #[serde(rename = "deviceName", default)]
    pub device_name: String,
    #[serde(rename = "deviceIdentifier", default)]
    pub device_identifier: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}
