//! Web server module for receiving platform webhooks.
//!
//! Routes:
//! - `GET /` lists retained events, most recent first
//! - `GET /health` liveness probe
//! - `GET <webhook path>` subscription handshake
//! - `POST <webhook path>` signed event delivery

pub mod error;
pub mod handlers;
pub mod handshake;
pub mod signature;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use error::WebhookError;
pub use handlers::{
    health, list_events, receive_event, verify_subscription, AppState, HealthResponse,
};
pub use handshake::{validate_handshake, HandshakeRejected, HubQuery};
pub use signature::{signature_header, verify_signature};

/// Build the application router for `state`.
pub fn router(state: AppState) -> Router {
    let webhook_path = state.config.webhook_path.clone();

    Router::new()
        .route("/", get(list_events))
        .route("/health", get(health))
        .route(&webhook_path, get(verify_subscription).post(receive_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
