//! HTTP server initialization and routing

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api_router::configure_api_routes;
use crate::core::error::ApiError;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::security::create_cors_layer;

use super::{health_check, shutdown_signal};

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

/// Full application: API routes, health check, CORS and request tracing.
pub fn build_app(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config.server.cors_origins);

    configure_api_routes(Arc::clone(&app_state))
        .route(ApiUrls::HEALTH, get(health_check))
        .fallback(route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let address = app_state.config.bind_address();
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| std::io::Error::other(format!("Invalid bind address {address}: {e}")))?;

    let app = build_app(app_state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
