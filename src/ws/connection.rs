//! WebSocket connection loop for the admin interaction feed.
//!
//! Reads commands from the client and forwards domain events that match
//! the connection's subscriptions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{DomainEvent, EntityId};
use crate::service::EventTracker;

/// Runs the read/write loop for a single WebSocket connection.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DomainEvent>,
    tracker: Arc<EventTracker>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &tracker).await;
                        if let Some(json) = encode(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.entity_id()) {
                            continue;
                        }
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            serde_json::to_value(&event).unwrap_or_default(),
                        );
                        if let Some(json) = encode(&msg)
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn encode(msg: &WsMessage) -> Option<String> {
    serde_json::to_string(msg).ok()
}

/// Splits raw ids into parsed entity ids and the wildcard flag. Ids that
/// are not UUIDs are skipped.
fn parse_ids(raw: &[String]) -> (Vec<EntityId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw.iter().filter_map(|s| s.parse().ok()).collect();
    (ids, wildcard)
}

/// Handles one client text frame and returns the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    tracker: &EventTracker,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { entity_ids } => {
            let (ids, wildcard) = parse_ids(&entity_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { entity_ids } => {
            let (ids, wildcard) = parse_ids(&entity_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::GetAnalytics { entity_id } => {
            let Ok(entity_id) = entity_id.parse::<EntityId>() else {
                return WsMessage::error(msg.id, 400, "invalid entity id");
            };
            match tracker.analytics(entity_id).await {
                Ok(analytics) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::to_value(&analytics).unwrap_or_default(),
                ),
                Err(e) => WsMessage::error(msg.id, e.error_code(), &e.to_string()),
            }
        }
    }
}
