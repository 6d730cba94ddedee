//! Artifact models
//!
//! Artifacts are append-only documents. A revision is a new row with the same
//! project and type; the newest `created_at` wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// One stored version of a generated document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: i64,
    pub project_id: i64,
    pub stage: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Coarse pipeline phase label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Requirement,
    Design,
    Implement,
    Verification,
    Governance,
    Mcp,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Requirement => "REQUIREMENT",
            Stage::Design => "DESIGN",
            Stage::Implement => "IMPLEMENT",
            Stage::Verification => "VERIFICATION",
            Stage::Governance => "GOVERNANCE",
            Stage::Mcp => "MCP",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document kinds the pipeline knows how to produce and consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    ProblemDef,
    DataSpec,
    ModelDesign,
    TestCase,
    PerfReport,
    TrustReport,
    GovReport,
    McpYaml,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 8] = [
        ArtifactType::ProblemDef,
        ArtifactType::DataSpec,
        ArtifactType::ModelDesign,
        ArtifactType::TestCase,
        ArtifactType::PerfReport,
        ArtifactType::TrustReport,
        ArtifactType::GovReport,
        ArtifactType::McpYaml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::ProblemDef => "PROBLEM_DEF",
            ArtifactType::DataSpec => "DATA_SPEC",
            ArtifactType::ModelDesign => "MODEL_DESIGN",
            ArtifactType::TestCase => "TEST_CASE",
            ArtifactType::PerfReport => "PERF_REPORT",
            ArtifactType::TrustReport => "TRUST_REPORT",
            ArtifactType::GovReport => "GOV_REPORT",
            ArtifactType::McpYaml => "MCP_YAML",
        }
    }

    /// Stage label normally written alongside this type
    pub fn default_stage(&self) -> Stage {
        match self {
            ArtifactType::ProblemDef => Stage::Requirement,
            ArtifactType::DataSpec | ArtifactType::ModelDesign => Stage::Design,
            ArtifactType::TestCase => Stage::Implement,
            ArtifactType::PerfReport => Stage::Verification,
            ArtifactType::TrustReport | ArtifactType::GovReport => Stage::Governance,
            ArtifactType::McpYaml => Stage::Mcp,
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown artifact type: {}", s))
    }
}

/// Request to append a new artifact version
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveArtifactRequest {
    #[validate(length(min = 1, max = 64, message = "Stage is required"))]
    pub stage: String,
    #[validate(length(min = 1, max = 64, message = "Artifact type is required"))]
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub content: String,
}

/// Query selecting an artifact type
#[derive(Debug, Deserialize)]
pub struct ArtifactTypeQuery {
    #[serde(rename = "type")]
    pub artifact_type: String,
}

/// Per-type progress row for a project's dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactOverview {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub stage: String,
    pub versions: i64,
    pub latest_at: DateTime<Utc>,
}

/// Response listing an artifact history
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactListResponse {
    pub artifacts: Vec<Artifact>,
    pub total: usize,
}

/// Response after saving an artifact
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSavedResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_type_round_trips_through_tag() {
        for t in ArtifactType::ALL {
            assert_eq!(t.as_str().parse::<ArtifactType>().unwrap(), t);
        }
    }

    #[test]
    fn test_artifact_type_parse_is_case_insensitive() {
        assert_eq!("mcp_yaml".parse::<ArtifactType>().unwrap(), ArtifactType::McpYaml);
        assert!("SOMETHING_ELSE".parse::<ArtifactType>().is_err());
    }

    #[test]
    fn test_default_stage() {
        assert_eq!(ArtifactType::PerfReport.default_stage(), Stage::Verification);
        assert_eq!(ArtifactType::GovReport.default_stage().as_str(), "GOVERNANCE");
    }

    #[test]
    fn test_artifact_serializes_type_field() {
        let artifact = Artifact {
            id: 1,
            project_id: 2,
            stage: "REQUIREMENT".to_string(),
            artifact_type: "PROBLEM_DEF".to_string(),
            content: "draft".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "PROBLEM_DEF");
        assert_eq!(json["projectId"], 2);
    }
}
