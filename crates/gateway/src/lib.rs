//! HTTP and WebSocket gateway for chatrelay.
//!
//! Serves the embedded chat page, a health check, and the `/ws` relay. The
//! gateway owns presence and the broadcast hub; everything the assistant
//! does goes through the agent crate's `Coordinator`.
//!
//! Built on Axum.

pub mod frontend;
pub mod hub;
pub mod presence;
pub mod ws;

use std::sync::Arc;

use axum::{Router, extract::State, response::Json, routing::get};
use chatrelay_agent::{Coordinator, FallbackOrchestrator};
use chatrelay_config::AppConfig;
use chatrelay_core::error::ContextError;
use chatrelay_core::random::{RandomSource, ThreadRandom};
use chatrelay_memory::{ConversationContextStore, spawn_sweeper};
use chatrelay_providers::FallbackChain;
use serde::Serialize;
use tracing::info;

use crate::hub::Hub;
use crate::presence::Presence;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub coordinator: Arc<Coordinator>,
    pub hub: Arc<Hub>,
    pub presence: Presence,
}

impl GatewayState {
    /// Wire the responder to a fresh hub and context store.
    pub fn new(
        config: AppConfig,
        chain: FallbackChain,
        random: Arc<dyn RandomSource>,
    ) -> Result<Arc<Self>, ContextError> {
        let store = Arc::new(ConversationContextStore::with_limits(
            config.context.max_entries,
            config.context.max_idle(),
        )?);
        let hub = Arc::new(Hub::default());
        let coordinator = Arc::new(Coordinator::new(
            FallbackOrchestrator::new(chain, random.clone()),
            store,
            hub.clone(),
            random,
            &config,
        ));

        Ok(Arc::new(Self {
            config,
            coordinator,
            hub,
            presence: Presence::new(),
        }))
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway and run until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let chain = chatrelay_providers::build_from_config(&config);
    let state = GatewayState::new(config.clone(), chain, Arc::new(ThreadRandom))?;

    let sweeper = spawn_sweeper(
        state.coordinator.store().clone(),
        config.context.sweep_interval(),
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Chat server running, open http://{addr} in your browser");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down gracefully...");
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    online_users: usize,
    active_contexts: usize,
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        online_users: state.presence.online().await,
        active_contexts: state.coordinator.store().len().await,
    })
}
