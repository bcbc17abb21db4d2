//! Webhook endpoints.
//!
//! - `GET /webhook` — Messenger verification handshake
//! - `POST /webhook` — Messenger page events
//! - `POST /api/events` — a single pre-parsed [`InboundEvent`]

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::InboundEvent;
use super::orchestrator::Orchestrator;

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub orchestrator: Arc<Orchestrator>,
    /// Expected `hub.verify_token`. `None` rejects every handshake.
    pub verify_token: Option<String>,
}

// ── Messenger envelope ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    #[serde(default)]
    pub message: Option<MessagePart>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyPart>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuickReplyPart {
    pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct Postback {
    pub payload: String,
}

impl WebhookPayload {
    /// Flatten the envelope into inbound events, skipping echoes of the page's
    /// own messages and deliveries/reads that carry nothing.
    pub fn into_events(self) -> Vec<InboundEvent> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.messaging)
            .filter_map(|event| {
                let sender_id = event.sender.id;
                if let Some(postback) = event.postback {
                    return Some(InboundEvent::quick_reply(sender_id, postback.payload));
                }
                let message = event.message?;
                if message.is_echo {
                    return None;
                }
                Some(InboundEvent {
                    sender_id,
                    text: message.text,
                    quick_reply_payload: message.quick_reply.map(|q| q.payload),
                    has_attachment: !message.attachments.is_empty(),
                })
            })
            .collect()
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook
///
/// Echoes `hub.challenge` when the mode is `subscribe` and the token matches.
async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    let token_ok = matches!(
        (&state.verify_token, &params.verify_token),
        (Some(expected), Some(given)) if expected == given
    );
    match (params.mode.as_deref(), params.challenge) {
        (Some("subscribe"), Some(challenge)) if token_ok => {
            info!("Webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        _ => {
            warn!("Webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook
///
/// Acknowledges once the events are queued; each user's events are applied
/// in arrival order by that user's worker.
async fn receive(
    State(state): State<WebhookState>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    if payload.object != "page" {
        debug!(object = %payload.object, "Ignoring non-page webhook");
        return StatusCode::NOT_FOUND.into_response();
    }

    let events = payload.into_events();
    dispatch(&state, events).await;
    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

/// POST /api/events
async fn receive_event(
    State(state): State<WebhookState>,
    Json(event): Json<InboundEvent>,
) -> impl IntoResponse {
    if event.sender_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "sender_id is required"})),
        )
            .into_response();
    }
    dispatch(&state, vec![event]).await;
    StatusCode::ACCEPTED.into_response()
}

/// Hand events to their users' inbound queues, in the order they arrived.
async fn dispatch(state: &WebhookState, events: Vec<InboundEvent>) {
    if events.is_empty() {
        return;
    }
    let request_id = Uuid::new_v4();
    info!(%request_id, events = events.len(), "Inbound events received");

    async {
        for event in events {
            state.orchestrator.submit(event).await;
        }
    }
    .instrument(info_span!("webhook", %request_id))
    .await;
}

/// Build the webhook routes.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .route("/api/events", post(receive_event))
        .with_state(state)
}
