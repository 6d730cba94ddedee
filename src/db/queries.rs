//! SQL query constants
//!
//! Contains all SQL statements used by the artifact store.

/// Table layout shared with every other tool that opens the database file
pub const CREATE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS artifacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        stage TEXT NOT NULL,
        type TEXT NOT NULL,
        content TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_artifacts_project_type
        ON artifacts (project_id, type, created_at);
"#;

pub const INSERT_PROJECT: &str = r#"
    INSERT INTO projects (name, description, created_at)
    VALUES (?1, ?2, ?3)
"#;

pub const LIST_PROJECTS: &str = r#"
    SELECT id, name, description, created_at
    FROM projects
    ORDER BY created_at DESC, id DESC
"#;

pub const GET_PROJECT: &str = r#"
    SELECT id, name, description, created_at
    FROM projects
    WHERE id = ?1
"#;

pub const GET_PROJECT_BY_NAME: &str = r#"
    SELECT id, name, description, created_at
    FROM projects
    WHERE name = ?1
"#;

pub const PROJECT_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM projects WHERE id = ?1)";

pub const UPDATE_PROJECT: &str = r#"
    UPDATE projects
    SET name = ?1, description = ?2
    WHERE id = ?3
"#;

pub const DELETE_PROJECT_ARTIFACTS: &str = "DELETE FROM artifacts WHERE project_id = ?1";

pub const DELETE_PROJECT: &str = "DELETE FROM projects WHERE id = ?1";

pub const INSERT_ARTIFACT: &str = r#"
    INSERT INTO artifacts (project_id, stage, type, content, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
"#;

/// Newest first; id breaks ties between rows stamped in the same microsecond
pub const LIST_ARTIFACTS: &str = r#"
    SELECT id, project_id, stage, type, content, created_at
    FROM artifacts
    WHERE project_id = ?1 AND type = ?2
    ORDER BY created_at DESC, id DESC
"#;

pub const LATEST_ARTIFACT: &str = r#"
    SELECT id, project_id, stage, type, content, created_at
    FROM artifacts
    WHERE project_id = ?1 AND type = ?2
    ORDER BY created_at DESC, id DESC
    LIMIT 1
"#;

/// One row per artifact type with its version count and newest timestamp
pub const ARTIFACT_OVERVIEW: &str = r#"
    SELECT a.type,
           (SELECT b.stage FROM artifacts b
             WHERE b.project_id = a.project_id AND b.type = a.type
             ORDER BY b.created_at DESC, b.id DESC LIMIT 1) AS stage,
           COUNT(*) AS versions,
           MAX(a.created_at) AS latest_at
    FROM artifacts a
    WHERE a.project_id = ?1
    GROUP BY a.type
    ORDER BY latest_at DESC, a.type
"#;

pub const COUNT_PROJECT_ARTIFACTS: &str = "SELECT COUNT(*) FROM artifacts WHERE project_id = ?1";
