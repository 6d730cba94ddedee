//! Project management route handlers
//!
//! Handles CRUD operations for projects and the per-project dashboard views.

use crate::error::ApiResult;
use crate::governance::ModelContext;
use crate::models::{
    ArtifactOverview, CreateProjectRequest, MessageResponse, Project, ProjectCreatedResponse,
    ProjectListQuery, ProjectListResponse, ProjectWithStats, SuccessResponse, UpdateProjectRequest,
};
use crate::projects::ProjectRegistry;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};
use validator::Validate;

/// Create a new project
pub async fn create_project(
    State(state): State<SharedState>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<SuccessResponse<ProjectCreatedResponse>>> {
    payload.validate()?;
    debug!("Creating project: {}", payload.name);

    let project = state
        .store
        .run(move |store| {
            ProjectRegistry::new(store).create(&payload.name, payload.description.as_deref())
        })
        .await?;

    info!("Project created: {} (id: {})", project.name, project.id);

    Ok(Json(SuccessResponse::with_data(
        "Project created successfully.",
        ProjectCreatedResponse { id: project.id },
    )))
}

/// List all projects, newest first, or the one matching `?name=`
pub async fn list_projects(
    State(state): State<SharedState>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<SuccessResponse<ProjectListResponse>>> {
    let projects = state
        .store
        .run(move |store| {
            let registry = ProjectRegistry::new(store);
            match query.name {
                Some(name) => Ok(registry.find_by_name(&name)?.into_iter().collect()),
                None => registry.list(),
            }
        })
        .await?;
    let total = projects.len();

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} projects.", total),
        ProjectListResponse { projects, total },
    )))
}

/// Get a single project with its artifact count
pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<ProjectWithStats>>> {
    let project = state
        .store
        .run(move |store| ProjectRegistry::new(store).with_stats(id))
        .await?;

    Ok(Json(SuccessResponse::with_data("Project retrieved.", project)))
}

/// Rename a project or change its description
pub async fn update_project(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<SuccessResponse<Project>>> {
    payload.validate()?;

    let project = state
        .store
        .run(move |store| {
            ProjectRegistry::new(store).update(id, &payload.name, payload.description.as_deref())
        })
        .await?;

    info!("Project updated: {} (id: {})", project.name, project.id);

    Ok(Json(SuccessResponse::with_data(
        "Project updated successfully.",
        project,
    )))
}

/// Delete a project together with all of its artifacts
pub async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .store
        .run(move |store| ProjectRegistry::new(store).delete(id))
        .await?;

    info!("Project deleted: {}", id);

    Ok(Json(MessageResponse::new("Project deleted successfully.")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub project: Project,
    pub artifacts: Vec<ArtifactOverview>,
}

/// Which documents exist for a project, per type
pub async fn project_overview(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<ProjectOverview>>> {
    let overview = state
        .store
        .run(move |store| {
            let project = ProjectRegistry::new(store.clone()).require_project(id)?;
            let artifacts = store.get_artifact_overview(id)?;
            Ok(ProjectOverview { project, artifacts })
        })
        .await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} document types recorded.", overview.artifacts.len()),
        overview,
    )))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelContextTemplate {
    pub content: String,
}

/// Default model-context YAML for a project
pub async fn model_context_template(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<ModelContextTemplate>>> {
    let content = state
        .store
        .run(move |store| {
            let project = ProjectRegistry::new(store).require_project(id)?;
            ModelContext::template(project.id, &project.name)
        })
        .await?;

    Ok(Json(SuccessResponse::with_data(
        "Model context template generated.",
        ModelContextTemplate { content },
    )))
}
