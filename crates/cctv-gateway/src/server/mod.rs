//! Gateway server setup
//!
//! Provides the HTTP/WebSocket router, state construction and the server
//! runner with graceful shutdown.

mod handler;
mod middleware;
mod response;
mod state;

pub use handler::gateway_handler;
pub use response::ApiError;
pub use state::GatewayState;

use crate::broadcast::HubStatsSnapshot;
use crate::hub::EventHub;
use axum::{extract::State, routing::get, Json, Router};
use cctv_common::{AppConfig, AppError, AppResult};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
}

/// Service banner returned from `/`
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: &'static str,
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/ws/events", get(gateway_handler))
        .route("/ws/stats", get(hub_stats))
}

/// GET /health
async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.config().app.name.clone(),
    })
}

/// GET /
async fn service_info(State(state): State<GatewayState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.config().app.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ws/stats
async fn hub_stats(State(state): State<GatewayState>) -> Json<HubStatsSnapshot> {
    Json(state.hub().stats())
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let config = state.config();
    let router = middleware::apply_middleware(
        create_router(),
        &config.cors,
        config.app.env.is_production(),
    );
    router.with_state(state)
}

/// Create the hub and `GatewayState` from configuration
#[must_use]
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let hub = EventHub::new_shared(config.hub.clone());

    tracing::info!(
        max_connections = ?config.hub.max_connections,
        send_timeout_ms = config.hub.send_timeout_ms,
        heartbeat_timeout_ms = ?config.hub.heartbeat_timeout_ms,
        "Event hub created"
    );

    GatewayState::new(hub, config)
}

/// Run the gateway server until `shutdown` resolves
///
/// The hub is shut down first, so every client receives a going-away close
/// frame before the listener stops.
pub async fn run_server<F>(
    app: Router,
    listener: TcpListener,
    hub: Arc<EventHub>,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(AppError::internal)?;
    tracing::info!("Gateway listening on ws://{}/ws/events", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received, closing connections");
            hub.shutdown();
        })
        .await
        .map_err(AppError::internal)?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.gateway.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::server(format!("Failed to bind to {addr}: {e}")))?;

    let state = create_gateway_state(config);
    let hub = state.hub().clone();
    let app = create_app(state);

    run_server(app, listener, hub, shutdown_signal()).await
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
