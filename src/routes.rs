//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod artifact;
mod extract;
mod governance;
mod project;
mod stage;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Project routes
        .route(
            "/api/projects",
            get(project::list_projects).post(project::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(project::get_project)
                .put(project::update_project)
                .delete(project::delete_project),
        )
        .route("/api/projects/{id}/overview", get(project::project_overview))
        .route(
            "/api/projects/{id}/model-context/template",
            get(project::model_context_template),
        )

        // Artifact routes
        .route(
            "/api/projects/{id}/artifacts",
            get(artifact::list_artifacts).post(artifact::save_artifact),
        )
        .route(
            "/api/projects/{id}/artifacts/latest",
            get(artifact::latest_artifact),
        )

        // Pipeline stage routes
        .route("/api/stages", get(stage::list_stages))
        .route(
            "/api/projects/{id}/stages/{stage}/draft",
            post(stage::draft_stage),
        )
        .route(
            "/api/projects/{id}/stages/{stage}/commit",
            post(stage::commit_stage),
        )

        // Governance routes
        .route("/api/governance/rules", get(governance::list_rules))
        .route(
            "/api/projects/{id}/governance/evaluate",
            post(governance::evaluate),
        )
        .route(
            "/api/projects/{id}/governance/draft",
            post(governance::draft_report),
        )
        .route(
            "/api/projects/{id}/governance/commit",
            post(governance::commit_report),
        )

        // Extraction helpers
        .route("/api/extract/sections", post(extract::sections))
        .route("/api/extract/table", post(extract::table))
        .route("/api/extract/yaml", post(extract::yaml))

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::service::tests::test_store;
    use crate::generation::testing::ScriptedGenerator;
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(reply: &str) -> (Router, TempDir) {
        let (store, dir) = test_store();
        let settings = Settings::default();
        let generator = Arc::new(ScriptedGenerator::replying(reply));
        let state = Arc::new(AppState::new(store, generator, &settings));
        (create_router(state, &settings), dir)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _dir) = app("");
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_project_crud_and_duplicate_name() {
        let (app, _dir) = app("");

        let (status, body) = call(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "Churn", "description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = call(&app, "POST", "/api/projects", Some(json!({"name": "Churn"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_NAME");

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/projects/{}", id),
            Some(json!({"name": "Churn v2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Churn v2");

        let (_, body) = call(&app, "GET", "/api/projects", None).await;
        assert_eq!(body["data"]["total"], 1);

        let (status, body) = call(&app, "GET", "/api/projects?name=Churn%20v2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["projects"][0]["name"], "Churn v2");

        let (_, body) = call(&app, "GET", "/api/projects?name=Churn", None).await;
        assert_eq!(body["data"]["total"], 0);

        let (status, _) = call(&app, "DELETE", &format!("/api/projects/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", &format!("/api/projects/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_artifact_versions_through_http() {
        let (app, _dir) = app("");
        let (_, body) = call(&app, "POST", "/api/projects", Some(json!({"name": "p"}))).await;
        let id = body["data"]["id"].as_i64().unwrap();

        for content in ["v1", "v2"] {
            let (status, _) = call(
                &app,
                "POST",
                &format!("/api/projects/{}/artifacts", id),
                Some(json!({"stage": "REQUIREMENT", "type": "PROBLEM_DEF", "content": content})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = call(
            &app,
            "GET",
            &format!("/api/projects/{}/artifacts/latest?type=PROBLEM_DEF", id),
            None,
        )
        .await;
        assert_eq!(body["data"]["content"], "v2");

        let (_, body) = call(
            &app,
            "GET",
            &format!("/api/projects/{}/artifacts?type=PROBLEM_DEF", id),
            None,
        )
        .await;
        assert_eq!(body["data"]["total"], 2);

        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/projects/{}/artifacts/latest?type=GOV_REPORT", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = call(
            &app,
            "POST",
            "/api/projects/999/artifacts",
            Some(json!({"stage": "REQUIREMENT", "type": "PROBLEM_DEF", "content": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stage_draft_and_prerequisites() {
        let (app, _dir) = app("### 1. 모델 이름\nXGBoost");
        let (_, body) = call(&app, "POST", "/api/projects", Some(json!({"name": "p"}))).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/stages/model-design/draft", id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["code"], "MISSING_PREREQUISITE");

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/stages/problem-definition/commit", id),
            Some(json!({"content": "문제 정의"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/stages/model-design/draft", id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sections"]["complete"], false);
        assert_eq!(body["data"]["sections"]["sections"][0]["body"], "XGBoost");

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/stages/deployment/draft", id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_governance_routes() {
        let (app, _dir) = app("리스크 분석");
        let (_, body) = call(&app, "GET", "/api/governance/rules", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 4);

        let (_, body) = call(&app, "POST", "/api/projects", Some(json!({"name": "p"}))).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/governance/evaluate", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert!(body["message"].as_str().unwrap().contains("MCP_YAML"));

        let (_, template) = call(
            &app,
            "GET",
            &format!("/api/projects/{}/model-context/template", id),
            None,
        )
        .await;
        let yaml = template["data"]["content"].as_str().unwrap().to_string();
        let commits = [
            ("model-context", json!({"content": yaml})),
            (
                "performance-report",
                json!({"content": "양호", "metrics": [{"name": "Accuracy", "value": 0.95}]}),
            ),
            ("problem-definition", json!({"content": "개인정보는 비식별화한다"})),
        ];
        for (stage, payload) in commits {
            let (status, _) = call(
                &app,
                "POST",
                &format!("/api/projects/{}/stages/{}/commit", id, stage),
                Some(payload),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "commit {}", stage);
        }

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/governance/draft", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["narrative"], "리스크 분석");
        assert_eq!(body["data"]["evaluation"]["outcome"]["required"], 3);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/projects/{}/governance/commit", id),
            Some(json!({"narrative": "확정된 분석"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["artifact"]["type"], "GOV_REPORT");
    }

    #[tokio::test]
    async fn test_extract_routes() {
        let (app, _dir) = app("");

        let (_, body) = call(
            &app,
            "POST",
            "/api/extract/table",
            Some(json!({"text": "| a | b |\n|---|---|\n| 1 | 2 |"})),
        )
        .await;
        assert_eq!(body["data"]["rows"][0]["b"], "2");

        let (status, body) = call(
            &app,
            "POST",
            "/api/extract/yaml",
            Some(json!({"text": "- just\n- a list"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_FORMAT");
    }
}
