//! Governance rule evaluator
//!
//! Fixed checklist run against a project's model context, performance report
//! and problem definition. Required checks count towards the pass-count;
//! advisory checks only ever warn.

use super::context::ModelContext;
use crate::config::GovernanceConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// `Accuracy: 0.92`, `정확도 (Accuracy): 0.92`, `accuracy = 0.925`
static ACCURACY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)accuracy\)?\*{0,2}\s*[:=]\s*\**\s*([0-9]+(?:\.[0-9]+)?)")
        .expect("valid accuracy regex")
});

/// Check identifiers, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    ResponsiblePartyPresent,
    PerformanceThresholdMet,
    HighRiskFlag,
    PiiDisclosurePresent,
}

impl CheckId {
    pub const ORDER: [CheckId; 4] = [
        CheckId::ResponsiblePartyPresent,
        CheckId::PerformanceThresholdMet,
        CheckId::HighRiskFlag,
        CheckId::PiiDisclosurePresent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckId::ResponsiblePartyPresent => "responsible_party_present",
            CheckId::PerformanceThresholdMet => "performance_threshold_met",
            CheckId::HighRiskFlag => "high_risk_flag",
            CheckId::PiiDisclosurePresent => "pii_disclosure_present",
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            CheckId::HighRiskFlag => RuleKind::Advisory,
            _ => RuleKind::Required,
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Counts towards the pass-count
    Required,
    /// Reported as a warning, never counted
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Warn,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Warn => "WARN",
        }
    }
}

/// A rule definition, as listed to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: CheckId,
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: CheckId,
    pub verdict: Verdict,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceOutcome {
    pub checks: Vec<CheckResult>,
    /// Required checks that passed
    pub passed: usize,
    /// Number of required checks
    pub required: usize,
    /// Stable text rendering of `checks`, used in report prompts
    pub summary: String,
}

impl GovernanceOutcome {
    pub fn verdict(&self, id: CheckId) -> Option<Verdict> {
        self.checks.iter().find(|c| c.id == id).map(|c| c.verdict)
    }
}

/// Evaluates the governance checklist; holds only configuration
#[derive(Debug, Clone)]
pub struct GovernanceEvaluator {
    accuracy_threshold: f64,
    pii_markers: Vec<String>,
}

impl GovernanceEvaluator {
    pub fn new(config: &GovernanceConfig) -> Self {
        Self {
            accuracy_threshold: config.accuracy_threshold,
            pii_markers: config.pii_markers.clone(),
        }
    }

    /// Rule catalogue in evaluation order
    pub fn rules(&self) -> Vec<Rule> {
        CheckId::ORDER
            .iter()
            .map(|&id| {
                let (name, description) = match id {
                    CheckId::ResponsiblePartyPresent => (
                        "Responsible party declared".to_string(),
                        "The model context names a non-empty responsible_party".to_string(),
                    ),
                    CheckId::PerformanceThresholdMet => (
                        "Accuracy threshold met".to_string(),
                        format!(
                            "The performance report states an accuracy of at least {}",
                            self.accuracy_threshold
                        ),
                    ),
                    CheckId::HighRiskFlag => (
                        "High-risk model".to_string(),
                        "Warns when the model context risk_level is High".to_string(),
                    ),
                    CheckId::PiiDisclosurePresent => (
                        "Personal data disclosed".to_string(),
                        format!(
                            "The problem definition mentions one of: {} (substring heuristic)",
                            self.pii_markers.join(", ")
                        ),
                    ),
                };
                Rule {
                    id,
                    name,
                    description,
                    kind: id.kind(),
                }
            })
            .collect()
    }

    /// Run every check. Pure: identical inputs give identical outcomes.
    pub fn evaluate(
        &self,
        context: &ModelContext,
        performance_report: &str,
        problem_definition: &str,
    ) -> GovernanceOutcome {
        let checks: Vec<CheckResult> = CheckId::ORDER
            .iter()
            .map(|&id| match id {
                CheckId::ResponsiblePartyPresent => self.check_responsible_party(context),
                CheckId::PerformanceThresholdMet => self.check_accuracy(performance_report),
                CheckId::HighRiskFlag => self.check_risk_level(context),
                CheckId::PiiDisclosurePresent => self.check_pii(problem_definition),
            })
            .collect();

        let required = checks
            .iter()
            .filter(|c| c.id.kind() == RuleKind::Required)
            .count();
        let passed = checks
            .iter()
            .filter(|c| c.id.kind() == RuleKind::Required && c.verdict == Verdict::Pass)
            .count();
        let summary = render_summary(&checks, passed, required);

        GovernanceOutcome {
            checks,
            passed,
            required,
            summary,
        }
    }

    fn check_responsible_party(&self, context: &ModelContext) -> CheckResult {
        let id = CheckId::ResponsiblePartyPresent;
        match context.responsible_party.as_deref() {
            Some(party) if context.has_responsible_party() => CheckResult {
                id,
                verdict: Verdict::Pass,
                detail: format!("responsible_party: {}", party),
            },
            _ => CheckResult {
                id,
                verdict: Verdict::Fail,
                detail: "responsible_party is missing or empty".to_string(),
            },
        }
    }

    fn check_accuracy(&self, performance_report: &str) -> CheckResult {
        let id = CheckId::PerformanceThresholdMet;
        match extract_accuracy(performance_report) {
            // Accuracy is a fraction; anything above 1 is percent-scale
            Some(accuracy) if accuracy > 1.0 => CheckResult {
                id,
                verdict: Verdict::Fail,
                detail: format!("accuracy {} is outside [0, 1]; report it as a fraction", accuracy),
            },
            Some(accuracy) if accuracy >= self.accuracy_threshold => CheckResult {
                id,
                verdict: Verdict::Pass,
                detail: format!("accuracy {} >= {}", accuracy, self.accuracy_threshold),
            },
            Some(accuracy) => CheckResult {
                id,
                verdict: Verdict::Fail,
                detail: format!("accuracy {} < {}", accuracy, self.accuracy_threshold),
            },
            None => CheckResult {
                id,
                verdict: Verdict::Fail,
                detail: "no 'Accuracy: <number>' found in the performance report".to_string(),
            },
        }
    }

    fn check_risk_level(&self, context: &ModelContext) -> CheckResult {
        let level = context.risk_level.as_deref().unwrap_or("unspecified");
        CheckResult {
            id: CheckId::HighRiskFlag,
            verdict: if context.is_high_risk() {
                Verdict::Warn
            } else {
                Verdict::Pass
            },
            detail: format!("risk_level: {}", level),
        }
    }

    fn check_pii(&self, problem_definition: &str) -> CheckResult {
        let id = CheckId::PiiDisclosurePresent;
        let found = self
            .pii_markers
            .iter()
            .find(|marker| !marker.is_empty() && problem_definition.contains(marker.as_str()));

        match found {
            Some(marker) => CheckResult {
                id,
                verdict: Verdict::Pass,
                detail: format!("problem definition mentions '{}'", marker),
            },
            None => CheckResult {
                id,
                verdict: Verdict::Fail,
                detail: "problem definition does not mention personal data handling".to_string(),
            },
        }
    }
}

/// First accuracy figure in the text
pub fn extract_accuracy(text: &str) -> Option<f64> {
    ACCURACY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn render_summary(checks: &[CheckResult], passed: usize, required: usize) -> String {
    let mut out = String::new();
    for check in checks {
        // Writing to a String cannot fail
        let _ = writeln!(out, "- [{}] {}: {}", check.verdict.as_str(), check.id, check.detail);
    }
    let _ = write!(out, "Required checks passed: {}/{}", passed, required);
    out
}
