//! Pipeline stage route handlers
//!
//! Drafts are generated and returned without being saved; a commit appends
//! the confirmed document as a new artifact version.

use crate::error::{ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::pipeline::{
    CommitRequest, CommittedArtifact, DraftRequest, StageDescriptor, StageDraft, StageKey,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};

fn stage_key(raw: &str) -> Result<StageKey, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

/// Stage catalogue with tags, inputs and parse modes
pub async fn list_stages(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<StageDescriptor>>>> {
    let stages = state.pipeline.stages();
    Ok(Json(SuccessResponse::with_data(
        format!("{} stages available.", stages.len()),
        stages,
    )))
}

/// Generate a draft for one stage
pub async fn draft_stage(
    State(state): State<SharedState>,
    Path((project_id, stage)): Path<(i64, String)>,
    Json(payload): Json<DraftRequest>,
) -> ApiResult<Json<SuccessResponse<StageDraft>>> {
    let stage = stage_key(&stage)?;
    debug!(
        "Drafting {} for project {} ({} inputs, {} metrics)",
        stage,
        project_id,
        payload.inputs.len(),
        payload.metrics.len()
    );

    let draft = state.pipeline.draft(project_id, stage, payload).await?;

    Ok(Json(SuccessResponse::with_data("Draft generated.", draft)))
}

/// Save the confirmed document of one stage
pub async fn commit_stage(
    State(state): State<SharedState>,
    Path((project_id, stage)): Path<(i64, String)>,
    Json(payload): Json<CommitRequest>,
) -> ApiResult<Json<SuccessResponse<CommittedArtifact>>> {
    let stage = stage_key(&stage)?;
    let committed = state.pipeline.commit(project_id, stage, payload).await?;

    info!(
        "Stage {} committed for project {} as {} #{}",
        stage, project_id, committed.artifact_type, committed.id
    );

    Ok(Json(SuccessResponse::with_data(
        format!("{} saved.", committed.artifact_type),
        committed,
    )))
}
