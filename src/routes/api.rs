use crate::{
    docs::ApiDoc,
    handlers::{build, diagnostics, document, health_check, ready_check, run},
    state::AppState,
    websocket::handler::websocket_handler,
};
use axum::{http::{header, HeaderValue, Method}, routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::{cors::{AllowOrigin, CorsLayer}, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/diagnostics", get(diagnostics))
        .route("/document", get(document))
        .route("/build", post(build))
        .route("/run", post(run))
}

/// Assemble the whole application: websocket endpoint, REST API, Swagger UI
/// and the optional static editor assets.
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/ws", get(websocket_handler))
        .nest("/api", create_api_routes())
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(dir) = &app_state.config.static_dir {
        info!("📂 Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    let mut router = router.layer(TraceLayer::new_for_http());
    if let Some(cors) = cors_layer(&app_state.config.cors_origin_list()) {
        router = router.layer(cors);
    }
    router.with_state(app_state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(config: Config, content: &str) -> Router {
        create_app(Arc::new(AppState::new(config, content)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_and_document_endpoints() {
        let (status, body) = get_json(app(Config::default(), "int x;"), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);

        let (status, body) = get_json(app(Config::default(), "int x;"), "/api/document").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"content": "int x;", "version": 0}));
    }

    #[tokio::test]
    async fn not_ready_without_session_slots() {
        let config = Config { max_sessions: 0, ..Config::default() };
        let (status, body) = get_json(app(config, ""), "/api/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }

    #[tokio::test]
    async fn oversized_build_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            max_content_size: 4,
            sandbox_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let request = Request::builder()
            .method("POST")
            .uri("/api/build")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"code": "int main(void) { return 0; }"}).to_string()))
            .unwrap();
        let response = app(config, "").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join("rest").exists());
    }

    #[tokio::test]
    async fn run_without_build_reports_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { sandbox_dir: dir.path().to_path_buf(), ..Config::default() };
        let request = Request::builder().method("POST").uri("/api/run").body(Body::empty()).unwrap();
        let response = app(config, "").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let result: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("Executable not found"));
    }

    #[tokio::test]
    async fn diagnostics_report_the_latest_editor() {
        let state = Arc::new(AppState::new(Config::default(), "abc"));
        let (_, body) = get_json(create_app(state.clone()), "/api/diagnostics").await;
        assert_eq!(body["version"], 0);
        assert!(body["last_editor"].is_null());

        let (transport, _rx) = crate::ws::session::Transport::channel(8);
        let session_id = {
            let mut collab = state.collab.lock().await;
            let session_id = collab.connect(transport).unwrap();
            collab
                .apply_operation(&session_id, &json!({"type": "insert", "position": 3, "content": "d"}))
                .unwrap();
            session_id
        };

        let (status, body) = get_json(create_app(state), "/api/diagnostics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["n_sessions"], 1);
        assert_eq!(body["version"], 1);
        assert_eq!(body["content_length"], 4);
        assert_eq!(body["last_editor"], session_id.as_str());
        assert!(body["last_edit_at"].is_string());
    }

    #[test]
    fn invalid_cors_origins_are_dropped() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_none());
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_some());
    }
}
