//! Local read-only proxy for the mirror-node transactions endpoint.

use crate::config::Config;
use crate::error::FetchError;
use crate::mirror::{MirrorClient, TransactionQuery};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct ProxyState {
    pub mirror: MirrorClient,
}

/// Router with `/api/transactions` and `/health`, allowing exactly one CORS origin.
pub fn router(state: ProxyState, cors_origin: &str) -> Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/api/transactions", get(transactions))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn health() -> impl IntoResponse {
    "OK"
}

/// GET /api/transactions. Passes the mirror body through unchanged.
async fn transactions(State(state): State<ProxyState>, Query(query): Query<TransactionQuery>) -> Response {
    match state.mirror.fetch_raw(&query).await {
        Ok(body) => Json(body).into_response(),
        Err(FetchError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg).into_response(),
        Err(e) => {
            error!("Error fetching transactions: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    if config.proxy.require_operator {
        let operator = config.require_operator()?;
        info!("Operator account {} configured", operator.account_id);
    }

    let mirror = MirrorClient::from_config(config)?;
    let app = router(ProxyState { mirror }, &config.proxy.cors_origin)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.proxy.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        "Server running on port {} (mirror node {}, CORS origin {})",
        config.proxy.port, config.mirror_node_url, config.proxy.cors_origin
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use mockito::{Matcher, Server};
    use std::time::Duration;
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:5173";

    fn localhost_binding_permitted() -> bool {
        std::net::TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn app(base_url: &str) -> Router {
        let mirror = MirrorClient::new(base_url, Duration::from_secs(2)).unwrap();
        router(ProxyState { mirror }, ORIGIN).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("http://127.0.0.1:9")
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_transactions_pass_through() {
        if !localhost_binding_permitted() {
            return;
        }

        let body = r#"{"transactions":[{"entity_id":"0.0.123","charged_tx_fee":5}],"links":{"next":"/api/v1/transactions?page=2"}}"#;
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/transactions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("account.id".into(), "0.0.123".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(
                Request::builder()
                    .uri("/api/transactions?account_id=0.0.123&limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let expected: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json, expected);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(502)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(Request::builder().uri("/api/transactions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Server error");
    }

    #[tokio::test]
    async fn test_invalid_account_is_bad_request() {
        let response = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .uri("/api/transactions?account_id=alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_is_not_allowed() {
        let response = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/transactions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_allows_only_configured_origin() {
        let allowed = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let headers = allowed.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), ORIGIN);
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

        let other = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(other.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_router_rejects_bad_origin() {
        let mirror = MirrorClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(router(ProxyState { mirror }, "bad\norigin").is_err());
    }

    #[tokio::test]
    async fn test_serve_refuses_without_required_operator() {
        let mut config = Config::default();
        config.proxy.require_operator = true;
        assert!(serve(&config).await.is_err());
    }
}
