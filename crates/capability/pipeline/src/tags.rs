//! 标签集派生
//!
//! 每个点固定携带十个标签，记录中缺失的元数据替换为 "Unknown ..." 占位值，
//! 保证任意组合的标签过滤都能命中。

use domain::Record;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const UNKNOWN_CUSTOMER_ID: &str = "Unknown customer ID";
pub const UNKNOWN_CUSTOMER: &str = "Unknown customer";
pub const UNKNOWN_SITE_ID: &str = "Unknown site ID";
pub const UNKNOWN_SITE: &str = "Unknown site";
pub const UNKNOWN_GATEWAY: &str = "Unknown gateway";
pub const UNKNOWN_CONTROLLER: &str = "Unknown controller";
pub const UNKNOWN_DEVICE_TYPE: &str = "Unknown device type";
pub const UNKNOWN_CONTROLLER_IDENTIFIER: &str = "Unknown controller serial number";
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown device name";
pub const UNKNOWN_DEVICE_IDENTIFIER: &str = "Unknown device serial number";

/// 标签键（写入顺序无关，line protocol 编码时按键排序）
pub const TAG_KEYS: [&str; 10] = [
    "customerID",
    "customer",
    "siteID",
    "site",
    "gateway",
    "controller",
    "device_type",
    "controller_identifier",
    "device_name",
    "device_identifier",
];

/// 由记录派生的标签集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    pub customer_id: String,
    pub customer: String,
    pub site_id: String,
    pub site: String,
    pub gateway: String,
    pub controller: String,
    pub device_type: String,
    pub controller_identifier: String,
    pub device_name: String,
    pub device_identifier: String,
}

impl TagSet {
    pub fn from_record(record: &Record) -> Self {
        Self {
            customer_id: id_or(record.customer_id, UNKNOWN_CUSTOMER_ID),
            customer: text_or(&record.customer_name, UNKNOWN_CUSTOMER),
            site_id: id_or(record.site_id, UNKNOWN_SITE_ID),
            site: text_or(&record.site_name, UNKNOWN_SITE),
            gateway: text_or(&record.gateway, UNKNOWN_GATEWAY),
            controller: text_or(&record.controller, UNKNOWN_CONTROLLER),
            device_type: text_or(&record.device_type, UNKNOWN_DEVICE_TYPE),
            controller_identifier: text_or(
                &record.controller_identifier,
                UNKNOWN_CONTROLLER_IDENTIFIER,
            ),
            device_name: text_or(&record.device_name, UNKNOWN_DEVICE_NAME),
            device_identifier: text_or(&record.device_identifier, UNKNOWN_DEVICE_IDENTIFIER),
        }
    }

    /// 按标签键取值
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "customerID" => &self.customer_id,
            "customer" => &self.customer,
            "siteID" => &self.site_id,
            "site" => &self.site,
            "gateway" => &self.gateway,
            "controller" => &self.controller,
            "device_type" => &self.device_type,
            "controller_identifier" => &self.controller_identifier,
            "device_name" => &self.device_name,
            "device_identifier" => &self.device_identifier,
            _ => return None,
        };
        Some(value)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        let values = [
            self.customer_id,
            self.customer,
            self.site_id,
            self.site,
            self.gateway,
            self.controller,
            self.device_type,
            self.controller_identifier,
            self.device_name,
            self.device_identifier,
        ];
        TAG_KEYS
            .iter()
            .map(|key| key.to_string())
            .zip(values)
            .collect()
    }
}

fn text_or(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

fn id_or(value: Uuid, placeholder: &str) -> String {
    if value.is_nil() {
        placeholder.to_string()
    } else {
        value.hyphenated().to_string()
    }
}
