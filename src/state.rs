//! Application state management
//!
//! Contains shared state accessible across all handlers.
//! Nothing here is per-user or per-session: every request reads the store.

use crate::config::Settings;
use crate::db::ArtifactStore;
use crate::generation::TextGenerator;
use crate::governance::GovernanceEvaluator;
use crate::pipeline::DocumentPipeline;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Artifact store over the SQLite file
    pub store: ArtifactStore,

    /// Stage drafts, commits and governance reviews
    pub pipeline: DocumentPipeline,
}

impl AppState {
    pub fn new(store: ArtifactStore, generator: Arc<dyn TextGenerator>, settings: &Settings) -> Self {
        let pipeline = DocumentPipeline::new(
            store.clone(),
            generator,
            settings.generation.timeout(),
            GovernanceEvaluator::new(&settings.governance),
        );

        Self {
            store,
            pipeline,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
