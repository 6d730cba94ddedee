//! Stage catalogue

use crate::generation::prompts::{DATA_SPEC_HEADINGS, MODEL_DESIGN_HEADINGS, PROBLEM_HEADINGS};
use crate::models::{ArtifactType, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline steps a client can draft and commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKey {
    ProblemDefinition,
    DataSpec,
    ModelDesign,
    TestCases,
    PerformanceReport,
    TrustReport,
    ModelContext,
}

/// How a generated draft is read back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftParse {
    Headings(&'static [&'static str]),
    Table,
    Yaml,
    Plain,
}

impl StageKey {
    pub const ALL: [StageKey; 7] = [
        StageKey::ProblemDefinition,
        StageKey::DataSpec,
        StageKey::ModelDesign,
        StageKey::TestCases,
        StageKey::PerformanceReport,
        StageKey::TrustReport,
        StageKey::ModelContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::ProblemDefinition => "problem-definition",
            StageKey::DataSpec => "data-spec",
            StageKey::ModelDesign => "model-design",
            StageKey::TestCases => "test-cases",
            StageKey::PerformanceReport => "performance-report",
            StageKey::TrustReport => "trust-report",
            StageKey::ModelContext => "model-context",
        }
    }

    /// Artifact type this stage writes
    pub fn output(&self) -> ArtifactType {
        match self {
            StageKey::ProblemDefinition => ArtifactType::ProblemDef,
            StageKey::DataSpec => ArtifactType::DataSpec,
            StageKey::ModelDesign => ArtifactType::ModelDesign,
            StageKey::TestCases => ArtifactType::TestCase,
            StageKey::PerformanceReport => ArtifactType::PerfReport,
            StageKey::TrustReport => ArtifactType::TrustReport,
            StageKey::ModelContext => ArtifactType::McpYaml,
        }
    }

    pub fn stage(&self) -> Stage {
        self.output().default_stage()
    }

    /// Artifact type whose latest version must exist before drafting
    pub fn required_input(&self) -> Option<ArtifactType> {
        match self {
            StageKey::ProblemDefinition | StageKey::ModelContext => None,
            StageKey::DataSpec | StageKey::ModelDesign | StageKey::TrustReport => {
                Some(ArtifactType::ProblemDef)
            }
            StageKey::TestCases | StageKey::PerformanceReport => Some(ArtifactType::ModelDesign),
        }
    }

    pub fn parse(&self) -> DraftParse {
        match self {
            StageKey::ProblemDefinition => DraftParse::Headings(&PROBLEM_HEADINGS),
            StageKey::DataSpec => DraftParse::Headings(&DATA_SPEC_HEADINGS),
            StageKey::ModelDesign => DraftParse::Headings(&MODEL_DESIGN_HEADINGS),
            StageKey::TestCases => DraftParse::Table,
            StageKey::ModelContext => DraftParse::Yaml,
            StageKey::PerformanceReport | StageKey::TrustReport => DraftParse::Plain,
        }
    }

    pub fn descriptor(&self) -> StageDescriptor {
        let (parse, headings) = match self.parse() {
            DraftParse::Headings(headings) => ("headings", headings.to_vec()),
            DraftParse::Table => ("table", Vec::new()),
            DraftParse::Yaml => ("yaml", Vec::new()),
            DraftParse::Plain => ("none", Vec::new()),
        };
        StageDescriptor {
            key: *self,
            stage: self.stage(),
            output_type: self.output(),
            required_input: self.required_input(),
            parse,
            headings,
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown stage: {}", s))
    }
}

/// Stage catalogue entry as listed to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDescriptor {
    pub key: StageKey,
    pub stage: Stage,
    pub output_type: ArtifactType,
    pub required_input: Option<ArtifactType>,
    pub parse: &'static str,
    pub headings: Vec<&'static str>,
}
