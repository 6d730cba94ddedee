//! Database connection management
//!
//! The artifact database is a single SQLite file. Nothing holds a connection
//! between calls: every operation opens its own, runs one short transaction
//! and drops it.

pub mod queries;
pub mod service;

pub use service::ArtifactStore;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Handle to the SQLite database file
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Create a handle, making sure the parent directory exists
    pub fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        if let Some(dir) = config.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::Config(format!(
                        "Failed to create database directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                info!("Created database directory {}", dir.display());
            }
        }

        Ok(Self {
            path: config.path.clone(),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign keys enforced
    pub fn connect(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Create tables and indexes if they don't exist
    pub fn init_schema(&self) -> Result<(), AppError> {
        let conn = self.connect()?;
        conn.execute_batch(queries::CREATE_SCHEMA)?;
        debug!("Schema ready at {}", self.path.display());
        Ok(())
    }
}
