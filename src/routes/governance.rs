//! Governance review route handlers

use crate::error::ApiResult;
use crate::governance::{GovernanceEvaluation, Rule};
use crate::models::SuccessResponse;
use crate::pipeline::{GovernanceCommitted, GovernanceDraft};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceCommitRequest {
    pub narrative: String,
}

/// List the checklist the evaluator runs
pub async fn list_rules(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<Rule>>>> {
    let rules = state.pipeline.rules();
    Ok(Json(SuccessResponse::with_data(
        format!("{} governance rules.", rules.len()),
        rules,
    )))
}

/// Run the checklist against the latest artifacts
pub async fn evaluate(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<GovernanceEvaluation>>> {
    let evaluation = state.pipeline.evaluate(project_id).await?;
    let message = format!(
        "{}/{} required checks passed.",
        evaluation.outcome.passed, evaluation.outcome.required
    );

    Ok(Json(SuccessResponse::with_data(message, evaluation)))
}

/// Evaluate and generate the risk narrative
pub async fn draft_report(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<GovernanceDraft>>> {
    let draft = state.pipeline.governance_draft(project_id).await?;
    Ok(Json(SuccessResponse::with_data(
        "Governance report drafted.",
        draft,
    )))
}

/// Store the governance report with the confirmed narrative
pub async fn commit_report(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<GovernanceCommitRequest>,
) -> ApiResult<Json<SuccessResponse<GovernanceCommitted>>> {
    let committed = state
        .pipeline
        .governance_commit(project_id, &payload.narrative)
        .await?;

    info!(
        "Governance report #{} stored for project {}",
        committed.artifact.id, project_id
    );

    Ok(Json(SuccessResponse::with_data(
        "Governance report saved.",
        committed,
    )))
}
