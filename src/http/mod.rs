//! HTTP front end
//!
//! Provides:
//! - `POST /downlink` - normalize a payload and enqueue it for a device
//! - `GET /health` - liveness check

pub mod routes;
pub mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::chirpstack::DeviceQueue;
use types::ErrorBody;

/// State shared across handlers (read-only after startup)
pub struct AppState {
    pub queue: Arc<dyn DeviceQueue>,
}

pub type SharedState = Arc<AppState>;

/// Create the bridge router
pub fn create_router(queue: Arc<dyn DeviceQueue>) -> Router {
    let state = Arc::new(AppState { queue });

    Router::new()
        .route("/downlink", post(routes::downlink))
        .route("/health", get(routes::health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router until Ctrl+C
pub async fn serve(bind: &str, router: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener on {}: {}", bind, e))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal server error".to_string(),
        }),
    )
        .into_response()
}
