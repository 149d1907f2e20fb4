use anyhow::{Context, Result};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::errors::ApiError;
use crate::handlers::{
    handle_health, handle_method_not_allowed, handle_not_found, handle_predict, handle_welcome,
};
use crate::state::{AppState, SharedState};

pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.bind_address();
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(&addr).await?;

    info!("Wine API listening on {}", addr);
    info!("Endpoints:");
    info!("  GET  /        - welcome message");
    info!("  GET  /health  - health check");
    info!("  POST /predict - wine class prediction");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Wine API server terminated unexpectedly")
}

pub async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind API listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind API listener on {addr}"))
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/",
            get(handle_welcome).fallback(handle_method_not_allowed),
        )
        .route(
            "/health",
            get(handle_health).fallback(handle_method_not_allowed),
        )
        .route(
            "/predict",
            post(handle_predict).fallback(handle_method_not_allowed),
        )
        .fallback(handle_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a handler panic into the regular 500 JSON body
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Handler panicked: {}", details);
    ApiError::Internal(details).into_response()
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping server"),
        Err(err) => {
            warn!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
