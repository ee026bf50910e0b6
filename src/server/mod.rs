//! # HTTP RPC Server
//!
//! Exposes the printer operations over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! starbridge serve --listen 0.0.0.0:8080 --lan-host 192.168.1.50
//! ```
//!
//! ```bash
//! curl -X POST localhost:8080/api/getStatus \
//!      -d '{"interfaceType": "lan", "identifier": "192.168.1.50"}' \
//!      -H 'content-type: application/json'
//! ```
//!
//! Every method answers `{"success": true, "result": ...}` or
//! `{"success": false, "error": {"code", "kind", "message"}}`.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::PrinterService;

/// Build the router without binding a socket.
pub fn router(service: Arc<PrinterService>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/:method", post(handlers::rpc::call))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service))
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use starbridge::{config::BridgeConfig, server::serve};
///
/// # async fn example() -> std::io::Result<()> {
/// let config = BridgeConfig::default();
/// serve(&config.listen_addr, Arc::new(config.service())).await
/// # }
/// ```
pub async fn serve(listen_addr: &str, service: Arc<PrinterService>) -> std::io::Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "starbridge HTTP server listening");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ImageCrateDecoder;
    use crate::discovery::DiscoveryManager;
    use crate::transport::MockConnector;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(connector: MockConnector) -> Router {
        router(Arc::new(PrinterService::new(
            Arc::new(connector),
            Arc::new(ImageCrateDecoder),
            Arc::new(DiscoveryManager::new()),
        )))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app(MockConnector::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_invalid_argument_is_bad_request() {
        let (status, body) = post_json(
            app(MockConnector::new()),
            "/api/getStatus",
            json!({"interfaceType": "fax", "identifier": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!("INVALID_ARGUMENT"));
        assert_eq!(body["error"]["kind"], json!("InvalidArgument"));
    }

    #[tokio::test]
    async fn test_operation_failure_is_server_error() {
        let (status, body) = post_json(
            app(MockConnector::new()),
            "/api/searchPrinters",
            json!({"timeout": 50}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], json!("SEARCH_ERROR"));
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let (status, body) = post_json(
            app(MockConnector::new()),
            "/api/searchPrinters",
            json!({"timeout": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "result": []}));
    }

    #[tokio::test]
    async fn test_unreadable_body_gets_error_envelope() {
        let requests = [
            Request::builder()
                .method("POST")
                .uri("/api/getStatus")
                .body(Body::empty())
                .unwrap(),
            Request::builder()
                .method("POST")
                .uri("/api/getStatus")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        ];
        for request in requests {
            let response = app(MockConnector::new()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["success"], json!(false));
            assert_eq!(body["error"]["code"], json!("INVALID_ARGUMENT"));
        }
    }
}
