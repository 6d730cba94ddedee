//! Governance review
//!
//! Loads the latest prerequisite artifacts of a project and runs the rule
//! evaluator over them. Evaluation refuses to start while any required
//! artifact is missing.

pub mod context;
pub mod rules;

pub use context::ModelContext;
pub use rules::{GovernanceEvaluator, GovernanceOutcome, Rule};

use crate::db::ArtifactStore;
use crate::error::AppError;
use crate::models::{Artifact, ArtifactType};
use serde::Serialize;
use tracing::{debug, info};

/// Artifact types that must exist before evaluation, in the order checked
pub const PREREQUISITES: [ArtifactType; 3] = [
    ArtifactType::McpYaml,
    ArtifactType::PerfReport,
    ArtifactType::ProblemDef,
];

/// The artifact versions an evaluation was run against
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceInputs {
    pub model_context: Artifact,
    pub performance_report: Artifact,
    pub problem_definition: Artifact,
    /// Optional narrative context
    pub model_design: Option<Artifact>,
}

/// Evaluation result together with what it was computed from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvaluation {
    pub project_id: i64,
    pub context: ModelContext,
    pub outcome: GovernanceOutcome,
    pub inputs: GovernanceInputs,
}

/// Fetch the latest prerequisite versions; the first absent type is reported
pub fn load_inputs(store: &ArtifactStore, project_id: i64) -> Result<GovernanceInputs, AppError> {
    let [mcp, perf, problem] = PREREQUISITES;

    Ok(GovernanceInputs {
        model_context: require_latest(store, project_id, mcp)?,
        performance_report: require_latest(store, project_id, perf)?,
        problem_definition: require_latest(store, project_id, problem)?,
        model_design: store.get_latest_artifact(project_id, ArtifactType::ModelDesign.as_str())?,
    })
}

/// Latest version of a type that a stage cannot run without
pub fn require_latest(
    store: &ArtifactStore,
    project_id: i64,
    artifact_type: ArtifactType,
) -> Result<Artifact, AppError> {
    store
        .get_latest_artifact(project_id, artifact_type.as_str())?
        .ok_or_else(|| AppError::MissingPrerequisite(artifact_type.as_str().to_string()))
}

/// Load prerequisites for a project and evaluate them
pub fn evaluate_project(
    store: &ArtifactStore,
    evaluator: &GovernanceEvaluator,
    project_id: i64,
) -> Result<GovernanceEvaluation, AppError> {
    let inputs = load_inputs(store, project_id)?;
    debug!(
        "Evaluating governance for project {} (MCP_YAML #{}, PERF_REPORT #{}, PROBLEM_DEF #{})",
        project_id,
        inputs.model_context.id,
        inputs.performance_report.id,
        inputs.problem_definition.id
    );

    let context = ModelContext::from_document(&inputs.model_context.content)?;
    let outcome = evaluator.evaluate(
        &context,
        &inputs.performance_report.content,
        &inputs.problem_definition.content,
    );

    info!(
        "Governance evaluated for project {}: {}/{} required checks passed",
        project_id, outcome.passed, outcome.required
    );

    Ok(GovernanceEvaluation {
        project_id,
        context,
        outcome,
        inputs,
    })
}
