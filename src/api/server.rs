use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{counters, health_check, report, submit_action, AppState};
use crate::storage::{ActionStore, StoreConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store: StoreConfig::default(),
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/actions", post(submit_action))
        .route("/stats", get(report))
        .route("/stats/counters", get(counters))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server until ctrl-c, then stop the store
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(ActionStore::new(config.store.clone())?);
    let state = Arc::new(AppState {
        store: Arc::clone(&store),
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting avgstore server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.stop().await;

    let stats = store.stats();
    tracing::info!(
        aggregated = stats.aggregated,
        dropped = stats.dropped,
        actions = stats.actions,
        "avgstore server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");

    tracing::info!("Shutdown signal received, stopping aggregator...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<ActionStore>) {
        let store = Arc::new(ActionStore::new(StoreConfig::default()).unwrap());
        let state = Arc::new(AppState {
            store: Arc::clone(&store),
        });
        (build_router(state), store)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_action(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/actions")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, store) = create_test_app();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        store.stop().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_submit_and_report() {
        let (app, store) = create_test_app();

        for body in [
            r#"{"action":"jump", "time":100}"#,
            r#"{"action":"run", "time":75}"#,
            r#"{"action":"jump", "time":200}"#,
        ] {
            let response = app.clone().oneshot(post_action(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while store.stats().aggregated < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            report,
            serde_json::json!([
                {"action": "jump", "avg": 150},
                {"action": "run", "avg": 75}
            ])
        );

        store.stop().await;
    }

    #[tokio::test]
    async fn test_submit_invalid() {
        let (app, store) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_action(r#"{"action":"jump"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("time"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats/counters")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let counters: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(counters["rejected"], 1);
        assert_eq!(counters["submitted"], 0);

        store.stop().await;
    }
}
