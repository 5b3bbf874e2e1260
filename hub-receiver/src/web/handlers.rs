//! Webhook endpoint handlers.
//!
//! Ingestion runs three gates in order:
//! 1. Verify the signature over the raw body
//! 2. Extract and decode the payload as a JSON object
//! 3. Append it to the event log
//!
//! The log is only written after every gate has passed.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::event_log::{Event, EventLog};
use crate::web::error::WebhookError;
use crate::web::handshake::{validate_handshake, HubQuery};
use crate::web::signature::{signature_header, verify_signature};
use crate::Config;

/// Form field carrying the JSON payload in form-encoded deliveries.
const PAYLOAD_FORM_FIELD: &str = "payload";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: EventLog,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let events = EventLog::new(config.event_log_capacity);
        Self {
            config: Arc::new(config),
            events,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Event Snapshot
// =============================================================================

/// Retained events, most recent first.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.events.snapshot().await)
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// Subscription handshake endpoint.
///
/// Echoes `hub.challenge` verbatim when the mode and token check out.
pub async fn verify_subscription(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<String, WebhookError> {
    let query = HubQuery::parse(raw_query.as_deref().unwrap_or_default());

    let verdict = validate_handshake(&query.mode, &query.verify_token, &state.config.verify_token);
    if let Err(rejected) = verdict {
        warn!(mode = %query.mode, "subscription_handshake_rejected");
        return Err(rejected.into());
    }

    info!(challenge_length = query.challenge.len(), "subscription_handshake_accepted");

    Ok(query.challenge)
}

// =============================================================================
// Event Ingestion
// =============================================================================

/// Webhook delivery endpoint.
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookError> {
    let signature = signature_header(&headers);

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "event_received"
    );

    if !verify_signature(&body, signature, state.config.app_secret.as_bytes()) {
        warn!("event_signature_invalid");
        return Err(WebhookError::Unauthorized);
    }

    let payload = extract_payload(&headers, &body)?;

    let event: Event = serde_json::from_slice(&payload).map_err(|e| {
        warn!(error = %e, "event_decode_failed");
        WebhookError::from(e)
    })?;

    let fields = event.len();
    let retained = state.events.append(event).await;

    info!(
        fields = fields,
        retained = retained,
        capacity = state.events.capacity(),
        "event_stored"
    );

    Ok(StatusCode::OK)
}

/// Locate the JSON payload within the body according to its content type.
fn extract_payload<'a>(
    headers: &HeaderMap,
    body: &'a [u8],
) -> Result<Cow<'a, [u8]>, WebhookError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    match content_type.as_str() {
        "application/json" => Ok(Cow::Borrowed(body)),
        "application/x-www-form-urlencoded" => {
            let payload = url::form_urlencoded::parse(body)
                .find(|(key, _)| key == PAYLOAD_FORM_FIELD)
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
            Ok(Cow::Owned(payload.into_bytes()))
        }
        other => {
            warn!(content_type = %other, "event_content_type_unsupported");
            Err(WebhookError::Unauthorized)
        }
    }
}
