//! YAML document codec
//!
//! Model-context documents are YAML mappings. Parsing is all-or-nothing:
//! syntax errors and non-mapping documents surface as `InvalidFormat`.

use crate::error::AppError;
use serde_yaml::{Mapping, Value};

/// Parse a YAML mapping. A surrounding ```` ```yaml ```` fence is ignored.
pub fn parse_document(text: &str) -> Result<Mapping, AppError> {
    let body = strip_fence(text);

    let value: Value = serde_yaml::from_str(body).map_err(|e| {
        let detail = match e.location() {
            Some(loc) => format!("line {}, column {}: {}", loc.line(), loc.column(), e),
            None => e.to_string(),
        };
        AppError::InvalidFormat(detail)
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Err(AppError::InvalidFormat("document is empty".to_string())),
        other => Err(AppError::InvalidFormat(format!(
            "expected a mapping at the top level, found {}",
            kind(&other)
        ))),
    }
}

/// Serialize a mapping, keeping key order
pub fn serialize_document(mapping: &Mapping) -> Result<String, AppError> {
    serde_yaml::to_string(mapping)
        .map_err(|e| AppError::Internal(format!("Failed to serialize YAML: {}", e)))
}

fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (`yaml`, `yml`, ...) on the opening line
    match rest.split_once('\n') {
        Some((_, body)) => body,
        None => "",
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
