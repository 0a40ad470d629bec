//! HTTP receiver for the external gift-sub integration.
//!
//! `POST /gift` with a JSON body `{"username": "...", "recipient": "..."}`
//! (and an optional `"id"` used to reject redeliveries) feeds a
//! [`SubscriptionEvent`] into the relay loop, where it is rendered by the
//! same formatter as native Twitch gift subs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::common::error::EventError;
use crate::common::messages::SubscriptionEvent;

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-relay-secret";

#[derive(Debug, Default, Deserialize)]
struct GiftPayload {
    username: Option<String>,
    recipient: Option<String>,
    id: Option<String>,
}

struct GiftWebhookState {
    secret: Option<String>,
    gift_tx: mpsc::Sender<SubscriptionEvent>,
}

/// Bind and serve the gift webhook until shutdown.
pub async fn serve(
    bind: SocketAddr,
    secret: Option<String>,
    gift_tx: mpsc::Sender<SubscriptionEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Gift webhook listening on {}", listener.local_addr()?);

    axum::serve(listener, router(secret, gift_tx))
        .with_graceful_shutdown(async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        })
        .await?;

    info!("Gift webhook stopped");
    Ok(())
}

fn router(secret: Option<String>, gift_tx: mpsc::Sender<SubscriptionEvent>) -> Router {
    let state = Arc::new(GiftWebhookState {
        secret: secret.filter(|s| !s.is_empty()),
        gift_tx,
    });
    Router::new()
        .route("/gift", post(receive_gift))
        .with_state(state)
}

async fn receive_gift(
    State(state): State<Arc<GiftWebhookState>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !validate_secret(expected, provided) {
            warn!("Gift webhook request with missing or invalid secret");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event = match parse_gift(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejecting gift webhook payload");
            return StatusCode::UNPROCESSABLE_ENTITY;
        }
    };

    debug!("Gift webhook accepted: {:?}", event);
    match state.gift_tx.send(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            warn!("Relay loop is gone, dropping gift");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Constant-time secret comparison.
fn validate_secret(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    expected.ct_eq(provided).into()
}

#[derive(Debug, thiserror::Error)]
enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Event(#[from] EventError),
}

fn parse_gift(body: &str) -> Result<SubscriptionEvent, PayloadError> {
    let payload: GiftPayload = serde_json::from_str(body)?;
    let event = SubscriptionEvent::gift(payload.username.as_deref(), payload.recipient.as_deref())?;
    Ok(match payload.id.filter(|id| !id.is_empty()) {
        Some(id) => event.with_event_id(id),
        None => event,
    })
}
