//! Point → line protocol 编码
//!
//! `measurement,tag=value field=value timestamp_ns`，标签按 key 有序，
//! 空值标签省略。

use crate::error::TransportError;
use crate::models::Point;
use domain::FieldValue;
use std::fmt::Write;

/// 编码单个点；无字段、非有限浮点或超出纳秒范围的时间戳视为非法点。
pub fn encode(point: &Point) -> Result<String, TransportError> {
    if point.measurement().is_empty() {
        return Err(TransportError::InvalidPoint(
            "measurement name is empty".to_string(),
        ));
    }
    if point.fields().is_empty() {
        return Err(TransportError::InvalidPoint(format!(
            "point for {} has no fields",
            point.measurement()
        )));
    }
    let timestamp = point.timestamp().timestamp_nanos_opt().ok_or_else(|| {
        TransportError::InvalidPoint(format!(
            "timestamp {} out of range",
            point.timestamp().to_rfc3339()
        ))
    })?;

    let mut line = escape(point.measurement(), &[',', ' ']);
    for (key, value) in point.tags() {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    line.push(' ');
    for (index, (key, value)) in point.fields().iter().enumerate() {
        if index > 0 {
            line.push(',');
        }
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&field_value(key, value)?);
    }

    let _ = write!(line, " {}", timestamp);
    Ok(line)
}

fn field_value(key: &str, value: &FieldValue) -> Result<String, TransportError> {
    let encoded = match value {
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::Int(v) => format!("{}i", v),
        FieldValue::UInt(v) => format!("{}u", v),
        FieldValue::Float(v) => {
            if !v.is_finite() {
                return Err(TransportError::InvalidPoint(format!(
                    "field {} is not a finite number",
                    key
                )));
            }
            v.to_string()
        }
        FieldValue::String(v) => {
            let mut quoted = String::with_capacity(v.len() + 2);
            quoted.push('"');
            for ch in v.chars() {
                if ch == '"' || ch == '\\' {
                    quoted.push('\\');
                }
                quoted.push(ch);
            }
            quoted.push('"');
            quoted
        }
    };
    Ok(encoded)
}

fn escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            ch if special.contains(&ch) => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ch => escaped.push(ch),
        }
    }
    escaped
}
