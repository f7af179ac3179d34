//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, OpenAPI documentation and the
//! static front-end.

use crate::{
    handlers,
    models::{HealthResponse, VersionResponse},
    state::AppState,
    ws::ws_handler,
};

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::version),
    components(schemas(HealthResponse, VersionResponse)),
    tags(
        (name = "Yovo API", description = "Health and build information for the Yovo voice advisor")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
///
/// Every request, including static files and the WebSocket upgrade, gets an
/// access-log span and a completion line with status and latency.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    // Unknown paths fall through to the front-end bundle.
    let front_end =
        ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let api_router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/version", get(handlers::version))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .fallback_service(front_end)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;
    use yovo_core::{
        gateway::LLMGateway, llm_client::HttpLLMClient, orchestrator::SessionOrchestrator,
        provider::LlmSettings,
    };

    fn test_app() -> Router {
        let llm = Arc::new(LlmSettings::default());
        let client = HttpLLMClient::new(llm.timeout).expect("client should build");
        let gateway = LLMGateway::new(llm.clone(), Arc::new(client));
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            environment: Environment::Development,
            log_level: Level::DEBUG,
            llm,
            static_dir: PathBuf::from("./no-such-front-end"),
        };
        create_router(Arc::new(AppState {
            orchestrator: Arc::new(SessionOrchestrator::new(gateway)),
            config: Arc::new(config),
        }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.expect("Request failed");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let value: Value = serde_json::from_slice(&body).expect("Invalid JSON response");
        (status, value)
    }

    #[test]
    fn test_openapi_document_lists_http_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/api/version"));

        let schemas = doc.components.expect("components should be present").schemas;
        assert!(schemas.contains_key("HealthResponse"));
        assert!(schemas.contains_key("VersionResponse"));
    }

    #[tokio::test]
    async fn test_health_route_through_full_middleware_stack() {
        let (status, body) = get_json(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_version_route() {
        let (status, body) = get_json(test_app(), "/api/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_path_without_front_end_is_not_found() {
        let req = Request::builder()
            .uri("/some/page")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(req).await.expect("Request failed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
