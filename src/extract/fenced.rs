//! Fenced JSON block extraction for chat-style replies

use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid json block regex"));

/// Pull the first ```` ```json {...} ``` ```` object out of `text`
pub fn extract_json_block(text: &str) -> Result<Map<String, Value>, AppError> {
    let block = JSON_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| AppError::InvalidFormat("no fenced JSON object found".to_string()))?;

    match serde_json::from_str::<Value>(block.as_str()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::InvalidFormat("fenced JSON is not an object".to_string())),
        Err(e) => Err(AppError::InvalidFormat(format!("fenced JSON is malformed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_reply() {
        let reply = "정리했습니다.\n```json\n{\n  \"project_name\": \"이탈 예측\",\n  \"project_goal\": \"이탈 감소\"\n}\n```\n감사합니다.";
        let map = extract_json_block(reply).unwrap();
        assert_eq!(map["project_name"], "이탈 예측");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_or_broken_block_is_invalid_format() {
        for reply in [
            "no block here",
            "```json\n[1, 2]\n```",
            "```json\n{\"a\": }\n```",
            "```json\n{\"a\": 1}",
        ] {
            assert!(
                matches!(extract_json_block(reply), Err(AppError::InvalidFormat(_))),
                "input: {:?}",
                reply
            );
        }
    }
}
