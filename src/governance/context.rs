//! Model-context view
//!
//! Typed read of an `MCP_YAML` artifact. Documents may wrap their fields in a
//! root `mcp_context:` mapping or place them at the top level.

use crate::error::AppError;
use crate::extract::{parse_document, serialize_document};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

const ROOT_KEY: &str = "mcp_context";

/// Model metadata consumed by governance checks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelContext {
    pub model_id: Option<String>,
    pub model_name: Option<String>,
    pub version_tag: Option<String>,
    pub use_case: Option<String>,
    pub data_source: Option<String>,
    pub risk_level: Option<String>,
    pub status: Option<String>,
    /// Numeric entries of the `performance` mapping
    pub performance: BTreeMap<String, f64>,
    pub responsible_party: Option<String>,
    pub last_modified: Option<String>,
}

impl ModelContext {
    /// Parse a stored document. Requires a non-empty `model_id`.
    pub fn from_document(text: &str) -> Result<Self, AppError> {
        let document = parse_document(text)?;
        let context = Self::from_mapping(&document);

        if context.model_id.is_none() {
            return Err(AppError::InvalidFormat(format!(
                "model context must contain '{}.model_id'",
                ROOT_KEY
            )));
        }
        Ok(context)
    }

    /// Lenient read of an already parsed mapping; absent fields stay `None`
    pub fn from_mapping(document: &Mapping) -> Self {
        let fields = match document.get(ROOT_KEY) {
            Some(Value::Mapping(inner)) => inner,
            _ => document,
        };

        let performance = match fields.get("performance") {
            Some(Value::Mapping(perf)) => perf
                .iter()
                .filter_map(|(k, v)| Some((k.as_str()?.to_string(), number(v)?)))
                .collect(),
            _ => BTreeMap::new(),
        };

        Self {
            model_id: text_field(fields, "model_id"),
            model_name: text_field(fields, "model_name"),
            version_tag: text_field(fields, "version_tag"),
            use_case: text_field(fields, "use_case"),
            data_source: text_field(fields, "data_source"),
            risk_level: text_field(fields, "risk_level"),
            status: text_field(fields, "status"),
            performance,
            responsible_party: text_field(fields, "responsible_party"),
            last_modified: text_field(fields, "last_modified"),
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level
            .as_deref()
            .is_some_and(|level| level.trim().eq_ignore_ascii_case("high"))
    }

    pub fn has_responsible_party(&self) -> bool {
        self.responsible_party
            .as_deref()
            .is_some_and(|party| !party.trim().is_empty())
    }

    /// Default document offered for a project that has no model context yet
    pub fn template(project_id: i64, project_name: &str) -> Result<String, AppError> {
        serialize_document(&Self::template_at(project_id, project_name, Utc::now()))
    }

    pub fn template_at(project_id: i64, project_name: &str, now: DateTime<Utc>) -> Mapping {
        let mut performance = Mapping::new();
        performance.insert("accuracy".into(), Value::from(0.0));
        performance.insert("f1_score".into(), Value::from(0.0));

        let mut fields = Mapping::new();
        fields.insert(
            "model_id".into(),
            format!("PROJ_{}_{}", project_id, now.format("%Y%m%d%H%M")).into(),
        );
        fields.insert("model_name".into(), project_name.into());
        fields.insert("version_tag".into(), "v1.0.0".into());
        fields.insert("use_case".into(), "예: 고객 민원 자동 분류".into());
        fields.insert("data_source".into(), "예: 내부 CRM 데이터베이스 2024년 로그".into());
        fields.insert("risk_level".into(), "Medium".into());
        fields.insert("status".into(), "Development".into());
        fields.insert("performance".into(), Value::Mapping(performance));
        fields.insert("responsible_party".into(), "AI 개발팀".into());
        fields.insert("last_modified".into(), now.to_rfc3339().into());

        let mut document = Mapping::new();
        document.insert(ROOT_KEY.into(), Value::Mapping(fields));
        document
    }
}

/// Scalar field as text; empty strings and non-scalars count as absent
fn text_field(fields: &Mapping, key: &str) -> Option<String> {
    let text = match fields.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_wrapped_document() {
        let text = "mcp_context:\n  model_id: churn-001\n  risk_level: High\n  responsible_party: data-team\n  performance:\n    accuracy: 0.92\n    f1_score: '0.88'\n    note: n/a\n";
        let ctx = ModelContext::from_document(text).unwrap();

        assert_eq!(ctx.model_id.as_deref(), Some("churn-001"));
        assert!(ctx.is_high_risk());
        assert!(ctx.has_responsible_party());
        assert_eq!(ctx.performance.get("accuracy"), Some(&0.92));
        assert_eq!(ctx.performance.get("f1_score"), Some(&0.88));
        assert!(!ctx.performance.contains_key("note"));
    }

    #[test]
    fn test_reads_flat_document() {
        let ctx = ModelContext::from_document("model_id: 7\nrisk_level: low\n").unwrap();
        assert_eq!(ctx.model_id.as_deref(), Some("7"));
        assert!(!ctx.is_high_risk());
    }

    #[test]
    fn test_model_id_is_required() {
        for text in ["mcp_context:\n  risk_level: High\n", "model_id: ''\n", "mcp_context: {}\n"] {
            assert!(matches!(
                ModelContext::from_document(text),
                Err(AppError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_blank_responsible_party_is_absent() {
        let doc = parse_document("responsible_party: '   '\n").unwrap();
        let ctx = ModelContext::from_mapping(&doc);
        assert!(!ctx.has_responsible_party());
    }

    #[test]
    fn test_template_round_trips_through_reader() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let mapping = ModelContext::template_at(3, "Churn Model", now);
        let text = serialize_document(&mapping).unwrap();

        assert!(text.starts_with("mcp_context:"));
        let ctx = ModelContext::from_document(&text).unwrap();
        assert_eq!(ctx.model_id.as_deref(), Some("PROJ_3_202405010930"));
        assert_eq!(ctx.model_name.as_deref(), Some("Churn Model"));
        assert_eq!(ctx.risk_level.as_deref(), Some("Medium"));
        assert_eq!(ctx.performance.get("accuracy"), Some(&0.0));
    }
}
