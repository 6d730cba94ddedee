//! DocFlow API - AI Project Documentation Pipeline
//!
//! Walks an AI project through its documentation lifecycle: problem
//! definition, data and model design, test cases, performance and trust
//! reports, the model context, and a final governance review.
//!
//! Every document is an append-only, versioned artifact in a local SQLite
//! file. Drafts come from an external text-generation service and are only
//! persisted once the user commits them.

mod config;
mod db;
mod error;
mod extract;
mod generation;
mod governance;
mod models;
mod pipeline;
mod projects;
mod routes;
mod state;

use crate::config::Settings;
use crate::db::{ArtifactStore, Database};
use crate::generation::GeminiClient;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting DocFlow - AI Project Documentation Pipeline...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // Open the artifact store and make sure the schema exists
    let database = Database::new(&settings.database)?;
    database.init_schema()?;
    info!("✅ Artifact store ready at {}", database.path().display());

    let generator = GeminiClient::new(&settings.generation)?;
    if generator.is_configured() {
        info!(
            "🤖 Text generation via {} (timeout {}s)",
            settings.generation.model, settings.generation.timeout_secs
        );
    } else {
        warn!("⚠️  GEMINI_API_KEY not set, draft generation will be unavailable");
    }

    let state = Arc::new(AppState::new(
        ArtifactStore::new(database),
        Arc::new(generator),
        &settings,
    ));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Projects ───");
    info!("   GET  /api/projects?name=N                  - List projects (optional exact name)");
    info!("   POST /api/projects                         - Create project");
    info!("   GET  /api/projects/{{id}}                    - Project with artifact count");
    info!("   PUT  /api/projects/{{id}}                    - Rename / describe project");
    info!("   DEL  /api/projects/{{id}}                    - Delete project and artifacts");
    info!("   GET  /api/projects/{{id}}/overview           - Documents per type");
    info!("");
    info!("   ─── Artifacts ───");
    info!("   GET  /api/projects/{{id}}/artifacts?type=T   - Version history");
    info!("   GET  /api/projects/{{id}}/artifacts/latest   - Latest version of a type");
    info!("   POST /api/projects/{{id}}/artifacts          - Append a version");
    info!("");
    info!("   ─── Pipeline ───");
    info!("   GET  /api/stages                           - Stage catalogue");
    info!("   POST /api/projects/{{id}}/stages/{{stage}}/draft  - Generate a draft");
    info!("   POST /api/projects/{{id}}/stages/{{stage}}/commit - Save the confirmed document");
    info!("   GET  /api/projects/{{id}}/model-context/template - Default MCP YAML");
    info!("");
    info!("   ─── Governance ───");
    info!("   GET  /api/governance/rules                 - Checklist");
    info!("   POST /api/projects/{{id}}/governance/evaluate - Run the checklist");
    info!("   POST /api/projects/{{id}}/governance/draft    - Checklist + risk narrative");
    info!("   POST /api/projects/{{id}}/governance/commit   - Save GOV_REPORT");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,docflow_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
