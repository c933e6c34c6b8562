//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`:
//! - Session endpoints (create, inspect, delete, history)
//! - Image upload
//! - Analysis and video generation, plus result polling
//! - Export
//! - Health

pub mod analyze;
pub mod common;
pub mod export;
pub mod health;
pub mod middleware;
pub mod responses;
pub mod session;
pub mod upload;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, RequestStats};

/// Build the `/api/v1` router
pub fn build_api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(session::router())
        .merge(upload::router(&state.config.upload))
        .merge(analyze::router())
        .merge(export::router())
        .merge(health::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors_origin = &state.config.server.cors_origin;
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => CorsLayer::new().allow_origin(origin),
        Ok(_) => CorsLayer::new().allow_origin(Any),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", cors_origin);
            CorsLayer::new().allow_origin(Any)
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE])
    .expose_headers([
        HeaderName::from_static(middleware::X_RATELIMIT_LIMIT),
        HeaderName::from_static(middleware::X_RATELIMIT_REMAINING),
        HeaderName::from_static(middleware::X_RATELIMIT_RESET),
        header::CONTENT_DISPOSITION,
    ]);

    Router::new()
        .nest("/api/v1", build_api_router(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::UnconfiguredProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(Config::default(), Arc::new(UnconfiguredProvider)))
    }

    #[tokio::test]
    async fn test_routes_are_nested_under_api_v1() {
        let response = app()
            .oneshot(Request::post("/api/v1/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app()
            .oneshot(Request::post("/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}
