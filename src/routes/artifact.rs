//! Artifact route handlers
//!
//! Raw access to the versioned document history. Writes always append.

use crate::error::{not_found_error, ApiResult};
use crate::models::{
    Artifact, ArtifactListResponse, ArtifactSavedResponse, ArtifactTypeQuery,
    SaveArtifactRequest, SuccessResponse,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;
use validator::Validate;

/// Append a new version of an artifact
pub async fn save_artifact(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<SaveArtifactRequest>,
) -> ApiResult<Json<SuccessResponse<ArtifactSavedResponse>>> {
    payload.validate()?;

    let id = state
        .store
        .run(move |store| {
            store.save_artifact(
                project_id,
                payload.stage.trim(),
                payload.artifact_type.trim(),
                &payload.content,
            )
        })
        .await?;

    Ok(Json(SuccessResponse::with_data(
        "Artifact saved successfully.",
        ArtifactSavedResponse { id },
    )))
}

/// Every version of one type, newest first
pub async fn list_artifacts(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Query(query): Query<ArtifactTypeQuery>,
) -> ApiResult<Json<SuccessResponse<ArtifactListResponse>>> {
    debug!(
        "Listing {} artifacts for project {}",
        query.artifact_type, project_id
    );

    let artifacts = state
        .store
        .run(move |store| store.get_artifacts_for_project(project_id, query.artifact_type.trim()))
        .await?;
    let total = artifacts.len();

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} versions.", total),
        ArtifactListResponse { artifacts, total },
    )))
}

/// The newest version of one type
pub async fn latest_artifact(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Query(query): Query<ArtifactTypeQuery>,
) -> ApiResult<Json<SuccessResponse<Artifact>>> {
    let artifact_type = query.artifact_type.trim().to_string();
    let lookup = artifact_type.clone();

    let artifact = state
        .store
        .run(move |store| store.get_latest_artifact(project_id, &lookup))
        .await?
        .ok_or_else(|| {
            not_found_error(format!(
                "No {} artifact saved for project {}",
                artifact_type, project_id
            ))
        })?;

    Ok(Json(SuccessResponse::with_data("Artifact retrieved.", artifact)))
}
