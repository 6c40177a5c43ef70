//! HTTP gateway for EduPilot.
//!
//! Exposes the chat endpoint used by the dashboard widget, a context
//! preview for debugging, and a health check.
//!
//! Built on Axum.

pub mod api;

pub use api::{AppState, SharedState, api_router};

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use edupilot_assistant::ChatPipeline;
use edupilot_config::{AppConfig, GatewayConfig};
use edupilot_store::StoreClient;

/// Build the full router with every layer applied.
///
/// - CORS restricted to `gateway.allowed_origins`
/// - Request body size limit (1 MB)
/// - In-memory rate limiting per client (`/health` exempt)
/// - HTTP trace logging
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&gateway.allowed_origins))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    let mut router = api_router(state).layer(DefaultBodyLimit::max(1024 * 1024));

    if gateway.rate_limit_per_minute > 0 {
        let rate_limiter = Arc::new(RateLimiter::new(
            gateway.rate_limit_per_minute,
            std::time::Duration::from_secs(60),
        ));
        router = router.layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }));
    }

    router
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(parsed)
}

/// Build the shared state from config: provider, pipeline and store client
/// are constructed once and shared through `Arc`.
pub fn build_state(config: &AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    let router = edupilot_providers::router::build_from_config(config);
    let provider = router.default().ok_or_else(|| {
        format!(
            "No provider registered for '{}'. Check the [providers] section.",
            config.default_provider
        )
    })?;

    if !config.has_api_key() {
        warn!("No API key configured; chat requests will fail until one is set");
    }

    let pipeline = Arc::new(ChatPipeline::from_config(provider, config));

    let store = if config.store.backend == "none" {
        info!("Profile store disabled; requests without contextData get no context block");
        None
    } else {
        Some(Arc::new(StoreClient::new(config.store.clone())))
    };

    Ok(Arc::new(AppState::new(pipeline, store)))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(&config)?;
    let provider = state.provider.clone();
    let model = state.model.clone();
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, provider = %provider, model = %model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key.
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: std::time::Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<std::time::Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: std::time::Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        let now = std::time::Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Evict stale clients once the map gets large
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Keys clients by peer IP when connection info is available, otherwise
/// by `X-Forwarded-For`, otherwise "anonymous". Returns 429 when exceeded.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = client_key(&req);
    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(40).collect::<String>(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

fn client_key(req: &axum::extract::Request) -> String {
    if let Some(info) = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
    {
        return info.0.ip().to_string();
    }
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();
        build_state(&config).unwrap()
    }

    fn chat_request(client: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .header("X-Forwarded-For", client)
            .body(Body::from(r#"{"messages":[]}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(), &GatewayConfig::default());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn build_state_uses_configured_model() {
        let state = test_state();
        assert_eq!(state.provider, "gemini");
        assert_eq!(state.model, AppConfig::default().default_model);
        assert!(state.store.is_some());

        let mut config = AppConfig::default();
        config.store.backend = "none".into();
        assert!(build_state(&config).unwrap().store.is_none());
    }

    #[test]
    fn rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(2, std::time::Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[tokio::test]
    async fn rate_limit_applies_per_client() {
        let gateway = GatewayConfig {
            rate_limit_per_minute: 1,
            ..GatewayConfig::default()
        };
        let app = build_router(test_state(), &gateway);

        let first = app.clone().oneshot(chat_request("10.0.0.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = app.clone().oneshot(chat_request("10.0.0.1")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = app.clone().oneshot(chat_request("10.0.0.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::BAD_REQUEST);

        for _ in 0..3 {
            let req = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let app = build_router(test_state(), &GatewayConfig::default());

        let allowed = Request::builder()
            .uri("/health")
            .header("Origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(allowed).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );

        let denied = Request::builder()
            .uri("/health")
            .header("Origin", "http://evil.test")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(denied).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_state(), &GatewayConfig::default());
        let big = format!(
            r#"{{"messages":[{{"role":"user","content":"{}"}}]}}"#,
            "x".repeat(2 * 1024 * 1024)
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(big))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
