//! Live push channel for chat messages
//!
//! The Postgres implementation rides LISTEN/NOTIFY: inserts into the message
//! tables fire a trigger that NOTIFYs a JSON payload on the configured
//! channel, and each subscription filters the stream down to its room.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;
use uuid::Uuid;

use super::RoomId;
use crate::database::Database;
use crate::errors::DeskRagError;
use crate::models::{ChatMessage, Identity, MessageSource};
use crate::Result;

/// Connection-status report from the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Subscribed,
    ChannelError,
    TimedOut,
    Closed,
}

/// One event from a live subscription
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Status(SubscriptionStatus),
    Message(ChatMessage),
}

/// An established subscription; dropping the receiver releases the feed
pub struct LiveSubscription {
    pub events: mpsc::Receiver<FeedEvent>,
}

/// Push-channel boundary, implementable by tests with an in-memory sender
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Subscribe to insert events scoped to the room
    async fn subscribe(&self, room: &RoomId) -> Result<LiveSubscription>;
}

/// NOTIFY payload shape; group and direct rows share one wire form and are
/// normalized into the tagged message source here, at the boundary
#[derive(Debug, Deserialize)]
struct FeedPayload {
    id: Uuid,
    content: String,
    sender_id: String,
    sender_name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    recipient_id: Option<String>,
}

impl FeedPayload {
    fn normalize(self) -> Option<ChatMessage> {
        let source = match (self.channel_id, self.recipient_id) {
            (Some(channel_id), _) => MessageSource::Group { channel_id },
            (None, Some(recipient_id)) => MessageSource::Direct {
                sender_id: self.sender_id.clone(),
                recipient_id,
            },
            (None, None) => return None,
        };

        Some(ChatMessage {
            id: self.id,
            content: self.content,
            author: Identity {
                id: self.sender_id,
                name: self.sender_name,
            },
            created_at: self.created_at,
            source,
        })
    }
}

/// Live feed over Postgres LISTEN/NOTIFY
pub struct PgLiveFeed {
    database: Database,
    channel: String,
}

impl PgLiveFeed {
    pub fn new(database: Database, channel: impl Into<String>) -> Self {
        Self {
            database,
            channel: channel.into(),
        }
    }

    pub fn from_config(config: &crate::config::AppConfig, database: Database) -> Self {
        Self::new(database, config.chat.feed_channel.clone())
    }
}

#[async_trait]
impl LiveFeed for PgLiveFeed {
    async fn subscribe(&self, room: &RoomId) -> Result<LiveSubscription> {
        let mut listener = PgListener::connect_with(self.database.pool())
            .await
            .map_err(|e| DeskRagError::SubscriptionError(e.to_string()))?;
        listener
            .listen(&self.channel)
            .await
            .map_err(|e| DeskRagError::SubscriptionError(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        let room = room.clone();
        let channel = self.channel.clone();

        tokio::spawn(async move {
            debug!("Listening on {} for room {}", channel, room);
            if tx.send(FeedEvent::Status(SubscriptionStatus::Subscribed))
                .await
                .is_err()
            {
                return;
            }

            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let payload: FeedPayload =
                            match serde_json::from_str(notification.payload()) {
                                Ok(payload) => payload,
                                Err(e) => {
                                    warn!("Ignoring malformed feed payload: {}", e);
                                    continue;
                                }
                            };

                        let Some(message) = payload.normalize() else {
                            warn!("Feed payload without channel or recipient, ignoring");
                            continue;
                        };

                        // Client-side room filter; direct pairs match in
                        // both orientations
                        if !room.contains(&message.source) {
                            continue;
                        }

                        if tx.send(FeedEvent::Message(message)).await.is_err() {
                            // Subscriber released the feed
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Live feed receive failed for room {}: {}", room, e);
                        let _ = tx
                            .send(FeedEvent::Status(SubscriptionStatus::ChannelError))
                            .await;
                        return;
                    }
                }
            }
        });

        Ok(LiveSubscription { events: rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_normalizes_group_shape() {
        let payload: FeedPayload = serde_json::from_str(
            r#"{
                "id": "1f5fbd8e-9b2a-4a8f-9f6c-3f9f0a4b7d11",
                "content": "hi",
                "sender_id": "user1",
                "sender_name": "User One",
                "created_at": "2026-02-01T10:00:00Z",
                "channel_id": "general"
            }"#,
        )
        .unwrap();

        let message = payload.normalize().unwrap();
        assert_eq!(
            message.source,
            MessageSource::Group {
                channel_id: "general".to_string()
            }
        );
        assert_eq!(message.author.name, "User One");
    }

    #[test]
    fn test_payload_normalizes_direct_shape() {
        let payload: FeedPayload = serde_json::from_str(
            r#"{
                "id": "1f5fbd8e-9b2a-4a8f-9f6c-3f9f0a4b7d12",
                "content": "hi",
                "sender_id": "user2",
                "sender_name": "User Two",
                "created_at": "2026-02-01T10:00:00Z",
                "recipient_id": "user1"
            }"#,
        )
        .unwrap();

        let message = payload.normalize().unwrap();
        assert!(RoomId::direct("user1", "user2").contains(&message.source));
    }

    #[test]
    fn test_payload_without_destination_is_dropped() {
        let payload: FeedPayload = serde_json::from_str(
            r#"{
                "id": "1f5fbd8e-9b2a-4a8f-9f6c-3f9f0a4b7d13",
                "content": "hi",
                "sender_id": "user2",
                "sender_name": "User Two",
                "created_at": "2026-02-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert!(payload.normalize().is_none());
    }
}
