//! Parse-or-reject boundary for loosely shaped request bodies.
//!
//! The front-end sends optional fields with inconsistent names and types. Nothing past this
//! module sees a raw `serde_json::Value`: bodies become `AnalysisInput` / `ChatInput` or are
//! rejected.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::research::{AnalysisInput, Category, ChatInput, Device};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid request body")]
    Malformed,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Parses the analysis endpoint body.
///
/// - `topic` (required): trimmed, must be non-empty
/// - `researchType`: one of the three category labels, otherwise absent
/// - `device`: one of the two device labels, otherwise `모바일`
/// - `subService`: any non-null, non-empty value, stringified
pub fn parse_analysis_body(bytes: &[u8]) -> Result<AnalysisInput, RequestError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| RequestError::Malformed)?;
    let Some(obj) = value.as_object() else {
        return Err(RequestError::MissingField("topic"));
    };

    let topic = trimmed_str(obj, "topic").ok_or(RequestError::MissingField("topic"))?;

    Ok(AnalysisInput {
        category: category_field(obj, "researchType"),
        sub_service: loose_string(obj, "subService"),
        device: device_field(obj, "device").unwrap_or_default(),
        topic,
    })
}

/// Parses the chat endpoint body, accepting the legacy aliases
/// `input`, `serviceDetail` and `deviceType`.
pub fn parse_chat_body(bytes: &[u8]) -> Result<ChatInput, RequestError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| RequestError::Malformed)?;
    let Some(obj) = value.as_object() else {
        return Err(RequestError::MissingField("message"));
    };

    let message = trimmed_str(obj, "message")
        .or_else(|| trimmed_str(obj, "input"))
        .ok_or(RequestError::MissingField("message"))?;

    Ok(ChatInput {
        message,
        category: category_field(obj, "researchType"),
        sub_service: loose_string(obj, "subService").or_else(|| loose_string(obj, "serviceDetail")),
        device: device_field(obj, "device").or_else(|| device_field(obj, "deviceType")),
    })
}

fn trimmed_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn category_field(obj: &Map<String, Value>, key: &str) -> Option<Category> {
    obj.get(key).and_then(Value::as_str).and_then(Category::from_label)
}

fn device_field(obj: &Map<String, Value>, key: &str) -> Option<Device> {
    obj.get(key).and_then(Value::as_str).and_then(Device::from_label)
}

/// Any present value except `null` and `""`, converted to its display string.
fn loose_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
