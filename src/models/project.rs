//! Project models
//!
//! A project is the top-level grouping that owns a history of artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Project represents one AI initiative being documented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new project
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Project name must be between 1 and 200 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to update a project (name and description only)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Project name must be between 1 and 200 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Project returned together with how much has been documented so far
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithStats {
    #[serde(flatten)]
    pub project: Project,
    pub artifact_count: i64,
}

/// Optional exact-name filter for the project list
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub name: Option<String>,
}

/// Response for project list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub total: usize,
}

/// Response after creating a project
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreatedResponse {
    pub id: i64,
}
