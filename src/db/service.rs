//! Artifact store
//!
//! Versioned, append-only record of every generated document, scoped per
//! project and per document type. Projects own their artifacts: deleting a
//! project removes its whole history in the same transaction.

use super::queries;
use super::Database;
use crate::error::AppError;
use crate::models::{Artifact, ArtifactOverview, Project};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info, warn};

/// Store for projects and their artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    db: Database,
}

impl ArtifactStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run store work on the blocking thread pool
    pub async fn run<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(ArtifactStore) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || work(store)).await?
    }

    // ==================== Projects ====================

    /// Insert a project; a taken name fails with `DuplicateName` and writes nothing
    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<i64, AppError> {
        let conn = self.db.connect()?;

        match conn.execute(queries::INSERT_PROJECT, params![name, description, now_timestamp()]) {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                info!("Project created: {} (id: {})", name, id);
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!("Rejected duplicate project name: {}", name);
                Err(AppError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// All projects, newest first
    pub fn get_all_projects(&self) -> Result<Vec<Project>, AppError> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(queries::LIST_PROJECTS)?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>, AppError> {
        let conn = self.db.connect()?;
        let project = conn
            .query_row(queries::GET_PROJECT, params![id], project_from_row)
            .optional()?;
        Ok(project)
    }

    pub fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, AppError> {
        let conn = self.db.connect()?;
        let project = conn
            .query_row(queries::GET_PROJECT_BY_NAME, params![name], project_from_row)
            .optional()?;
        Ok(project)
    }

    /// Change name/description in place; artifacts are untouched
    pub fn update_project(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), AppError> {
        let conn = self.db.connect()?;

        let changed = match conn.execute(queries::UPDATE_PROJECT, params![name, description, id]) {
            Ok(changed) => changed,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::DuplicateName(name.to_string()));
            }
            Err(e) => return Err(AppError::Database(e)),
        };

        if changed == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        info!("Project updated: {} (id: {})", name, id);
        Ok(())
    }

    /// Delete a project and every artifact referencing it, atomically
    pub fn delete_project(&self, id: i64) -> Result<(), AppError> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        // The cascade would do this too; deleting explicitly keeps older
        // databases created without ON DELETE CASCADE consistent.
        let removed_artifacts = tx.execute(queries::DELETE_PROJECT_ARTIFACTS, params![id])?;
        let removed = tx.execute(queries::DELETE_PROJECT, params![id])?;

        if removed == 0 {
            // Dropping the transaction rolls back
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        tx.commit()?;
        info!(
            "Project {} deleted together with {} artifacts",
            id, removed_artifacts
        );
        Ok(())
    }

    pub fn count_artifacts(&self, project_id: i64) -> Result<i64, AppError> {
        let conn = self.db.connect()?;
        let count = conn.query_row(
            queries::COUNT_PROJECT_ARTIFACTS,
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==================== Artifacts ====================

    /// Append a new artifact version stamped with the current time
    pub fn save_artifact(
        &self,
        project_id: i64,
        stage: &str,
        artifact_type: &str,
        content: &str,
    ) -> Result<i64, AppError> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(queries::PROJECT_EXISTS, params![project_id], |row| {
            row.get(0)
        })?;
        if !exists {
            return Err(AppError::NotFound(format!("Project {} not found", project_id)));
        }

        match tx.execute(
            queries::INSERT_ARTIFACT,
            params![project_id, stage, artifact_type, content, now_timestamp()],
        ) {
            Ok(_) => {}
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(AppError::NotFound(format!("Project {} not found", project_id)));
            }
            Err(e) => return Err(AppError::Database(e)),
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "Artifact saved: project={} stage={} type={} id={} ({} bytes)",
            project_id,
            stage,
            artifact_type,
            id,
            content.len()
        );
        Ok(id)
    }

    /// Full history of one artifact type, newest first
    pub fn get_artifacts_for_project(
        &self,
        project_id: i64,
        artifact_type: &str,
    ) -> Result<Vec<Artifact>, AppError> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(queries::LIST_ARTIFACTS)?;
        let artifacts = stmt
            .query_map(params![project_id, artifact_type], artifact_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artifacts)
    }

    /// Newest version of one artifact type, if any has been saved
    pub fn get_latest_artifact(
        &self,
        project_id: i64,
        artifact_type: &str,
    ) -> Result<Option<Artifact>, AppError> {
        let conn = self.db.connect()?;
        let artifact = conn
            .query_row(
                queries::LATEST_ARTIFACT,
                params![project_id, artifact_type],
                artifact_from_row,
            )
            .optional()?;
        Ok(artifact)
    }

    /// Which document types exist for a project and how many versions each has
    pub fn get_artifact_overview(&self, project_id: i64) -> Result<Vec<ArtifactOverview>, AppError> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(queries::ARTIFACT_OVERVIEW)?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(ArtifactOverview {
                    artifact_type: row.get(0)?,
                    stage: row.get(1)?,
                    versions: row.get(2)?,
                    latest_at: timestamp_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ==================== Row mapping ====================

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

fn artifact_from_row(row: &Row<'_>) -> rusqlite::Result<Artifact> {
    Ok(Artifact {
        id: row.get(0)?,
        project_id: row.get(1)?,
        stage: row.get(2)?,
        artifact_type: row.get(3)?,
        content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        created_at: timestamp_column(row, 5)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        warn!("Unreadable timestamp in column {}: {}", idx, raw);
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {}", raw).into(),
        )
    })
}

// ==================== Timestamps ====================

/// Current time as fixed-width RFC 3339, so text order equals time order
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and the naive ISO-8601 form older databases contain
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ==================== Constraint classification ====================

fn constraint_extended_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Some(err.extended_code)
        }
        _ => None,
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    constraint_extended_code(e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    constraint_extended_code(e) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Fresh store backed by a file in a temp dir (kept alive by the guard)
    pub(crate) fn test_store() -> (ArtifactStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("artifacts.db"),
            busy_timeout_ms: 1000,
        };
        let db = Database::new(&config).unwrap();
        db.init_schema().unwrap();
        (ArtifactStore::new(db), dir)
    }

    fn contents(artifacts: &[Artifact]) -> Vec<&str> {
        artifacts.iter().map(|a| a.content.as_str()).collect()
    }

    #[test]
    fn test_create_project_assigns_first_id() {
        let (store, _dir) = test_store();
        let id = store.create_project("Churn Model", Some("desc")).unwrap();
        assert_eq!(id, 1);

        let project = store.get_project(id).unwrap().unwrap();
        assert_eq!(project.name, "Churn Model");
        assert_eq!(project.description.as_deref(), Some("desc"));
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_side_effects() {
        let (store, _dir) = test_store();
        store.create_project("Churn Model", Some("desc")).unwrap();
        let before = store.get_all_projects().unwrap();

        let err = store.create_project("Churn Model", Some("other desc")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(ref n) if n == "Churn Model"));

        let after = store.get_all_projects().unwrap();
        assert_eq!(before, after);
        assert_eq!(after.iter().filter(|p| p.name == "Churn Model").count(), 1);
        assert_eq!(after[0].description.as_deref(), Some("desc"));
    }

    #[test]
    fn test_get_all_projects_newest_first() {
        let (store, _dir) = test_store();
        store.create_project("first", None).unwrap();
        store.create_project("second", None).unwrap();
        store.create_project("third", None).unwrap();

        let names: Vec<_> = store
            .get_all_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_update_project_in_place() {
        let (store, _dir) = test_store();
        let id = store.create_project("old", Some("a")).unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "v1").unwrap();
        let created_at = store.get_project(id).unwrap().unwrap().created_at;

        store.update_project(id, "new", Some("b")).unwrap();

        let project = store.get_project(id).unwrap().unwrap();
        assert_eq!(project.name, "new");
        assert_eq!(project.description.as_deref(), Some("b"));
        assert_eq!(project.created_at, created_at);
        assert_eq!(store.get_artifacts_for_project(id, "PROBLEM_DEF").unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_project_is_not_found() {
        let (store, _dir) = test_store();
        let err = store.update_project(42, "x", None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_update_onto_taken_name_is_duplicate() {
        let (store, _dir) = test_store();
        store.create_project("a", None).unwrap();
        let b = store.create_project("b", None).unwrap();

        let err = store.update_project(b, "a", None).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(_)));
        assert_eq!(store.get_project(b).unwrap().unwrap().name, "b");
    }

    #[test]
    fn test_delete_project_cascades_to_artifacts() {
        let (store, _dir) = test_store();
        let id = store.create_project("Churn Model", None).unwrap();
        let other = store.create_project("Other", None).unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "a").unwrap();
        store.save_artifact(id, "DESIGN", "MODEL_DESIGN", "b").unwrap();
        store.save_artifact(id, "MCP", "MCP_YAML", "c").unwrap();
        store.save_artifact(other, "REQUIREMENT", "PROBLEM_DEF", "keep").unwrap();

        store.delete_project(id).unwrap();

        assert!(store.get_all_projects().unwrap().iter().all(|p| p.id != id));
        for t in ["PROBLEM_DEF", "MODEL_DESIGN", "MCP_YAML"] {
            assert!(store.get_artifacts_for_project(id, t).unwrap().is_empty());
        }
        assert_eq!(store.count_artifacts(id).unwrap(), 0);
        assert_eq!(
            contents(&store.get_artifacts_for_project(other, "PROBLEM_DEF").unwrap()),
            vec!["keep"]
        );
    }

    #[test]
    fn test_delete_missing_project_is_not_found() {
        let (store, _dir) = test_store();
        assert!(matches!(store.delete_project(7), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_latest_artifact_is_newest_version() {
        let (store, _dir) = test_store();
        let id = store.create_project("p", None).unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "draft v1").unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "draft v2").unwrap();

        let latest = store.get_latest_artifact(id, "PROBLEM_DEF").unwrap().unwrap();
        assert_eq!(latest.content, "draft v2");

        let history = store.get_artifacts_for_project(id, "PROBLEM_DEF").unwrap();
        assert_eq!(contents(&history), vec!["draft v2", "draft v1"]);
        assert!(history[0].created_at >= history[1].created_at);
    }

    #[test]
    fn test_saving_never_mutates_existing_rows() {
        let (store, _dir) = test_store();
        let id = store.create_project("p", None).unwrap();
        let first = store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "c1").unwrap();
        let original = store.get_latest_artifact(id, "PROBLEM_DEF").unwrap().unwrap();

        let second = store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "c2").unwrap();
        assert!(second > first);
        assert_eq!(store.count_artifacts(id).unwrap(), 2);

        let history = store.get_artifacts_for_project(id, "PROBLEM_DEF").unwrap();
        assert_eq!(history[1], original);
    }

    #[test]
    fn test_types_are_versioned_independently() {
        let (store, _dir) = test_store();
        let id = store.create_project("p", None).unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "problem").unwrap();
        store.save_artifact(id, "DESIGN", "MODEL_DESIGN", "design").unwrap();

        assert_eq!(
            store.get_latest_artifact(id, "PROBLEM_DEF").unwrap().unwrap().content,
            "problem"
        );
        assert!(store.get_latest_artifact(id, "PERF_REPORT").unwrap().is_none());
    }

    #[test]
    fn test_save_artifact_for_missing_project_is_not_found() {
        let (store, _dir) = test_store();
        let err = store.save_artifact(99, "REQUIREMENT", "PROBLEM_DEF", "x").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.count_artifacts(99).unwrap(), 0);
    }

    #[test]
    fn test_same_timestamp_falls_back_to_id_order() {
        let (store, _dir) = test_store();
        let id = store.create_project("p", None).unwrap();
        let conn = store.db.connect().unwrap();
        for content in ["older", "newer"] {
            conn.execute(
                queries::INSERT_ARTIFACT,
                params![id, "REQUIREMENT", "PROBLEM_DEF", content, "2024-05-01T12:00:00.000000Z"],
            )
            .unwrap();
        }

        let latest = store.get_latest_artifact(id, "PROBLEM_DEF").unwrap().unwrap();
        assert_eq!(latest.content, "newer");
    }

    #[test]
    fn test_reads_naive_timestamps_from_older_databases() {
        let (store, _dir) = test_store();
        let conn = store.db.connect().unwrap();
        conn.execute(
            queries::INSERT_PROJECT,
            params!["legacy", None::<String>, "2024-05-01T12:34:56.789012"],
        )
        .unwrap();

        let project = store.get_project_by_name("legacy").unwrap().unwrap();
        assert_eq!(project.created_at.to_rfc3339(), "2024-05-01T12:34:56.789012+00:00");
    }

    #[test]
    fn test_artifact_overview_groups_by_type() {
        let (store, _dir) = test_store();
        let id = store.create_project("p", None).unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "a").unwrap();
        store.save_artifact(id, "REQUIREMENT", "PROBLEM_DEF", "b").unwrap();
        store.save_artifact(id, "MCP", "MCP_YAML", "c").unwrap();

        let overview = store.get_artifact_overview(id).unwrap();
        assert_eq!(overview.len(), 2);
        let problem = overview.iter().find(|o| o.artifact_type == "PROBLEM_DEF").unwrap();
        assert_eq!(problem.versions, 2);
        assert_eq!(problem.stage, "REQUIREMENT");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T12:00:00.000001Z").is_some());
        assert!(parse_timestamp("2024-05-01T12:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert_eq!(now_timestamp().len(), "2024-05-01T12:00:00.000000Z".len());
    }

    #[test]
    fn test_run_propagates_store_errors() {
        let (store, _dir) = test_store();

        let id = tokio_test::block_on(store.run(|s| s.create_project("p", None))).unwrap();
        let err = tokio_test::block_on(store.run(move |s| s.delete_project(id + 1))).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
