//! Server-Sent Events endpoints for real-time delivery.
//!
//! - `GET /events` — the caller's notification stream
//! - `GET /conversations/{id}/events` — a conversation's live chat stream
//!   (participants only)
//!
//! Both streams emit heartbeats to keep the connection alive. If a client
//! falls behind and the channel buffer overflows, a `catchup` event is
//! emitted; the client should re-sync through the REST listing endpoints.
//!
//! ```text
//! event: notification
//! data: {"type":"new_offer","title":"New offer received",...}
//!
//! event: heartbeat
//! data: {"timestamp":"2025-08-07T00:00:00Z"}
//!
//! event: catchup
//! data: {"events_missed":12,"timestamp":"..."}
//! ```

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use bookswap_core::ConversationId;
use bookswap_exchange::ExchangeError;

use crate::error::ApiError;
use crate::events::{CatchupEvent, HEARTBEAT_INTERVAL_SECS, HeartbeatEvent};
use crate::extract::Identity;
use crate::state::AppState;

// ============================================================================
// SSE Endpoints
// ============================================================================

/// GET /events - Subscribe to the caller's notification stream.
async fn subscribe_user_events(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.registry().subscribe_user(user);

    tracing::info!(user = %user, "Client subscribed to notification events");

    sse_stream(receiver, "notification")
}

/// GET /conversations/{id}/events - Subscribe to a conversation's live
/// chat stream. Participants only.
async fn subscribe_conversation_events(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let conversation = state
        .store()
        .get_conversation(id)
        .await
        .map_err(ExchangeError::from)?;

    if !conversation.is_participant(user.0) {
        return Err(ApiError::Forbidden(
            "only participants may subscribe to this conversation".to_string(),
        ));
    }

    let receiver = state
        .registry()
        .subscribe_conversation(ConversationId(id));

    tracing::info!(conversation = %id, user = %user, "Client subscribed to chat events");

    Ok(sse_stream(receiver, "message"))
}

// ============================================================================
// Stream Plumbing
// ============================================================================

/// Turn a broadcast receiver into an SSE stream with lag handling and a
/// heartbeat keep-alive.
fn sse_stream<E>(
    receiver: broadcast::Receiver<E>,
    event_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    E: Clone + Serialize + Send + 'static,
{
    let stream = stream::unfold(receiver, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(data) => {
                        let sse_event = Event::default().event(event_name).data(data);
                        return Some((Ok(sse_event), rx));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize event");
                        continue;
                    }
                },
                Err(RecvError::Lagged(count)) => {
                    // Client fell behind - tell it to re-sync via REST.
                    tracing::warn!(events_missed = count, "SSE client lagged, sending catchup");

                    let catchup = CatchupEvent {
                        events_missed: count,
                        timestamp: Utc::now(),
                    };

                    match serde_json::to_string(&catchup) {
                        Ok(data) => {
                            let sse_event = Event::default().event("catchup").data(data);
                            return Some((Ok(sse_event), rx));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize catchup event");
                            continue;
                        }
                    }
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("Event channel closed, ending SSE stream");
                    return None;
                }
            }
        }
    });

    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS))
        .event(
            Event::default().event("heartbeat").data(
                serde_json::to_string(&HeartbeatEvent {
                    timestamp: Utc::now(),
                })
                .unwrap_or_else(|_| r#"{"timestamp":"unknown"}"#.to_string()),
            ),
        );

    Sse::new(stream).keep_alive(keep_alive)
}

/// Build SSE event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(subscribe_user_events))
        .route("/conversations/{id}/events", get(subscribe_conversation_events))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_interval() {
        assert_eq!(HEARTBEAT_INTERVAL_SECS, 30);
    }
}
