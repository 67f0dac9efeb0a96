//! HTTP API.
//!
//! Routes:
//! - `GET  /health`
//! - `POST /api/analyze` (multipart: `ticker` + 1..N `files`)
//! - `GET  /api/runs/:run_id/log`

pub mod routes;

use crate::config::ServerConfig;
use crate::orchestrator::Analyzer;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

/// Build the application router with CORS and request tracing.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let router = Router::new()
        .route("/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/runs/:run_id/log", get(routes::run_log))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(create_cors_layer(config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(router)
}

/// Create the CORS layer. `*` allows any origin; anything else is a
/// comma-separated list of exact origins.
fn create_cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let allowed = config.allowed_origin.trim();
    let origin = if allowed == "*" {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            origins.push(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))?,
            );
        }
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Bind and serve until the process is stopped.
pub async fn serve(router: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .await
        .context("HTTP server terminated")
}
