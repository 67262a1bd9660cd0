//! Chat room connection manager
//!
//! Presents one logical room over the group and direct-message backing
//! stores plus a live push subscription, with unified deduplication and a
//! send path that works even when the live channel is down.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::feed::{FeedEvent, LiveFeed, SubscriptionStatus};
use super::log::MessageLog;
use super::RoomId;
use crate::database::MessageStore;
use crate::errors::DeskRagError;
use crate::models::{ChatMessage, ConnectionState, Identity, NewMessage, Session};
use crate::Result;

/// A live connection to one chat room, owned by one open view
pub struct ChatConnection {
    room: RoomId,
    identity: Option<Identity>,
    store: Arc<dyn MessageStore>,
    state: Arc<RwLock<ConnectionState>>,
    log: Arc<RwLock<MessageLog>>,
    consumer: Option<JoinHandle<()>>,
}

impl ChatConnection {
    /// Open a room: establish the live subscription, then load history.
    ///
    /// Without an authenticated identity the connection opens in `AuthError`
    /// and stays there until the view is reopened; no subscription or
    /// history load is attempted. A failed subscription degrades to
    /// `ConnectedBroadcastFallback` (send-only), never a hard failure.
    pub async fn open(
        room: RoomId,
        session: &Session,
        store: Arc<dyn MessageStore>,
        feed: &dyn LiveFeed,
        history_limit: i64,
    ) -> Self {
        let Some(identity) = session.current_identity().cloned() else {
            warn!("Opening room {} without an authenticated identity", room);
            return Self {
                room,
                identity: None,
                store,
                state: Arc::new(RwLock::new(ConnectionState::AuthError)),
                log: Arc::new(RwLock::new(MessageLog::new())),
                consumer: None,
            };
        };

        info!("Opening room {} as {}", room, identity.id);

        let state = Arc::new(RwLock::new(ConnectionState::Connecting));
        let log = Arc::new(RwLock::new(MessageLog::new()));

        // Subscribe before the history load so nothing pushed during the
        // load is missed; the log dedups whatever arrives in both paths
        let consumer = match feed.subscribe(&room).await {
            Ok(subscription) => Some(Self::spawn_consumer(
                subscription.events,
                Arc::clone(&state),
                Arc::clone(&log),
                room.clone(),
            )),
            Err(e) => {
                warn!(
                    "Live subscription failed for room {}, falling back to direct writes: {}",
                    room, e
                );
                *state.write().await = ConnectionState::ConnectedBroadcastFallback;
                None
            }
        };

        match store.recent_messages(&room, history_limit).await {
            Ok(history) => {
                let merged = log.write().await.merge_history(history);
                debug!("Merged {} historical messages for room {}", merged, room);
            }
            Err(e) => {
                // Degraded continuation: the room opens with whatever the
                // live feed delivers
                warn!("History load failed for room {}: {}", room, e);
            }
        }

        Self {
            room,
            identity: Some(identity),
            store,
            state,
            log,
            consumer,
        }
    }

    fn spawn_consumer(
        mut events: tokio::sync::mpsc::Receiver<FeedEvent>,
        state: Arc<RwLock<ConnectionState>>,
        log: Arc<RwLock<MessageLog>>,
        room: RoomId,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    FeedEvent::Status(SubscriptionStatus::Subscribed) => {
                        debug!("Room {} subscription acknowledged", room);
                        *state.write().await = ConnectionState::Connected;
                    }
                    FeedEvent::Status(status) => {
                        // Error, timeout and close all degrade the same way:
                        // the UI stays "connected", live push is not guaranteed
                        warn!("Room {} subscription degraded: {:?}", room, status);
                        *state.write().await = ConnectionState::ConnectedBroadcastFallback;
                    }
                    FeedEvent::Message(message) => {
                        let inserted = log.write().await.insert(message);
                        if !inserted {
                            debug!("Dropped duplicate push for room {}", room);
                        }
                    }
                }
            }
        })
    }

    /// Send a message to the room via a direct store write.
    ///
    /// Local precondition check only: empty content or a missing identity is
    /// rejected without a server round trip. Independent of the live
    /// subscription, so sends succeed in broadcast fallback too.
    pub async fn send(&self, content: &str) -> Result<ChatMessage> {
        if content.trim().is_empty() {
            warn!("Rejected empty message for room {}", self.room);
            return Err(DeskRagError::EmptyMessage);
        }
        let Some(identity) = &self.identity else {
            warn!("Rejected send without identity for room {}", self.room);
            return Err(DeskRagError::AuthRequired);
        };

        let message = self
            .store
            .insert_message(NewMessage {
                content: content.to_string(),
                author: identity.clone(),
                source: self.room.message_source(&identity.id),
            })
            .await?;

        // Local echo; the feed replaying the same id is deduplicated
        self.log.write().await.insert(message.clone());

        Ok(message)
    }

    /// Close the room and release the subscription resource exactly once
    pub async fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
        *self.state.write().await = ConnectionState::Disconnected;
        info!("Closed room {}", self.room);
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Whether the UI should report the room as connected
    pub async fn is_connected(&self) -> bool {
        self.state().await.is_connected()
    }

    /// Snapshot of the displayed message sequence, ascending by time
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.log.read().await.messages().to_vec()
    }

    /// The room this connection serves
    pub fn room(&self) -> &RoomId {
        &self.room
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        // close() releases the consumer; this covers views torn down
        // without an explicit close
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
    }
}
