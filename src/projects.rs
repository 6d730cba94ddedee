//! Project registry
//!
//! Domain wrapper over the store's project operations. Names are normalised
//! before they reach the database and collisions come back as
//! `AppError::DuplicateName` rather than a raw constraint failure.

use crate::db::ArtifactStore;
use crate::error::{not_found_error, validation_error, AppError};
use crate::models::{Project, ProjectWithStats};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    store: ArtifactStore,
}

impl ProjectRegistry {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    pub fn create(&self, name: &str, description: Option<&str>) -> Result<Project, AppError> {
        let name = normalize_name(name)?;
        let description = normalize_description(description);

        let id = self.store.create_project(name, description)?;
        self.require_project(id)
    }

    pub fn list(&self) -> Result<Vec<Project>, AppError> {
        self.store.get_all_projects()
    }

    /// Exact lookup after the same trimming `create` applies
    pub fn find_by_name(&self, name: &str) -> Result<Option<Project>, AppError> {
        let name = normalize_name(name)?;
        self.store.get_project_by_name(name)
    }

    /// Look up a project that a stage needs as its active selection
    pub fn require_project(&self, id: i64) -> Result<Project, AppError> {
        self.store
            .get_project(id)?
            .ok_or_else(|| not_found_error(format!("Project {} not found", id)))
    }

    pub fn with_stats(&self, id: i64) -> Result<ProjectWithStats, AppError> {
        let project = self.require_project(id)?;
        let artifact_count = self.store.count_artifacts(id)?;
        Ok(ProjectWithStats {
            project,
            artifact_count,
        })
    }

    pub fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, AppError> {
        let name = normalize_name(name)?;
        let description = normalize_description(description);

        self.store.update_project(id, name, description)?;
        self.require_project(id)
    }

    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        debug!("Deleting project {}", id);
        self.store.delete_project(id)
    }
}

fn normalize_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_error("Project name must not be empty"));
    }
    Ok(trimmed)
}

/// Blank descriptions are stored as NULL
fn normalize_description(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}
