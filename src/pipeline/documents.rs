//! Stored document layouts
//!
//! Reports are stored as markdown with fixed section titles. The performance
//! report lists its metrics as `- Name: value` lines so the governance
//! accuracy check can read them back.

use crate::error::{validation_error, AppError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One named performance figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

/// Inputs of the trust report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustFindings {
    pub fairness: String,
    pub explainability: String,
    pub robustness: String,
}

impl TrustFindings {
    pub fn from_inputs(inputs: &BTreeMap<String, String>) -> Result<Self, AppError> {
        let field = |key: &str| -> Result<String, AppError> {
            inputs
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| validation_error(format!("'{}' is required", key)))
        };
        Ok(Self {
            fairness: field("fairness")?,
            explainability: field("explainability")?,
            robustness: field("robustness")?,
        })
    }
}

/// Reject empty, unnamed or non-finite metrics, and accuracy outside [0, 1]
pub fn validate_metrics(metrics: &[Metric]) -> Result<(), AppError> {
    if metrics.is_empty() {
        return Err(validation_error("At least one metric is required"));
    }
    for metric in metrics {
        if metric.name.trim().is_empty() {
            return Err(validation_error("Metric names must not be empty"));
        }
        if !metric.value.is_finite() {
            return Err(validation_error(format!(
                "Metric '{}' must be a finite number",
                metric.name
            )));
        }
        if is_accuracy(&metric.name) && !(0.0..=1.0).contains(&metric.value) {
            return Err(validation_error(format!(
                "Metric '{}' must be a fraction within [0, 1], got {}",
                metric.name.trim(),
                metric.value
            )));
        }
    }
    Ok(())
}

fn is_accuracy(name: &str) -> bool {
    name.to_lowercase().contains("accuracy") || name.contains("정확도")
}

/// Name -> value mapping handed to chart rendering
pub fn metrics_mapping(metrics: &[Metric]) -> BTreeMap<String, f64> {
    metrics
        .iter()
        .map(|m| (m.name.trim().to_string(), m.value))
        .collect()
}

pub fn compose_performance_report(metrics: &[Metric], analysis: &str) -> String {
    let mut out = String::from("# 성능 평가 리포트\n\n## 성능 지표\n\n");
    for metric in metrics {
        let _ = writeln!(out, "- {}: {}", metric.name.trim(), metric.value);
    }
    let _ = write!(out, "\n## 종합 분석\n\n{}", analysis.trim());
    out
}

pub fn compose_trust_report(findings: &TrustFindings, analysis: &str) -> String {
    format!(
        "# Trustworthy AI 검증 리포트\n\n## 공정성 검증\n{}\n\n## 설명가능성 검증\n{}\n\n## 강건성 검증\n{}\n\n## 종합 분석 및 제언\n{}",
        findings.fairness,
        findings.explainability,
        findings.robustness,
        analysis.trim()
    )
}

pub fn compose_governance_report(check_summary: &str, narrative: &str) -> String {
    format!(
        "# 거버넌스 검토 리포트\n\n## 자동 점검 결과\n\n{}\n\n## 종합 리스크 분석\n\n{}",
        check_summary.trim(),
        narrative.trim()
    )
}
