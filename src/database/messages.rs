//! Chat message history and inserts for group channels and direct messages

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Database;
use crate::chat::RoomId;
use crate::models::{ChatMessage, Identity, MessageSource, NewMessage};
use crate::Result;

/// Storage boundary for chat messages (group and direct shapes)
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Load the `limit` most recent messages for the room,
    /// returned ascending by creation time
    async fn recent_messages(&self, room: &RoomId, limit: i64) -> Result<Vec<ChatMessage>>;

    /// Write a new message and return the stored row
    async fn insert_message(&self, message: NewMessage) -> Result<ChatMessage>;
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    channel_id: String,
    sender_id: String,
    sender_name: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<GroupRow> for ChatMessage {
    fn from(row: GroupRow) -> Self {
        ChatMessage {
            id: row.id,
            content: row.content,
            author: Identity {
                id: row.sender_id,
                name: row.sender_name,
            },
            created_at: row.created_at,
            source: MessageSource::Group {
                channel_id: row.channel_id,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct DirectRow {
    id: Uuid,
    sender_id: String,
    sender_name: String,
    recipient_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<DirectRow> for ChatMessage {
    fn from(row: DirectRow) -> Self {
        ChatMessage {
            id: row.id,
            content: row.content,
            author: Identity {
                id: row.sender_id.clone(),
                name: row.sender_name,
            },
            created_at: row.created_at,
            source: MessageSource::Direct {
                sender_id: row.sender_id,
                recipient_id: row.recipient_id,
            },
        }
    }
}

#[async_trait]
impl MessageStore for Database {
    async fn recent_messages(&self, room: &RoomId, limit: i64) -> Result<Vec<ChatMessage>> {
        match room {
            RoomId::Group(channel_id) => {
                // Most recent N, re-ordered ascending for display
                let rows = sqlx::query_as::<_, GroupRow>(
                    r"
                    SELECT id, channel_id, sender_id, sender_name, content, created_at
                    FROM (
                        SELECT id, channel_id, sender_id, sender_name, content, created_at
                        FROM channel_messages
                        WHERE channel_id = $1
                        ORDER BY created_at DESC
                        LIMIT $2
                    ) recent
                    ORDER BY created_at ASC
                    ",
                )
                .bind(channel_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows.into_iter().map(ChatMessage::from).collect())
            }
            RoomId::Direct { a, b } => {
                // Both orientations of the pair resolve to the same room
                let rows = sqlx::query_as::<_, DirectRow>(
                    r"
                    SELECT id, sender_id, sender_name, recipient_id, content, created_at
                    FROM (
                        SELECT id, sender_id, sender_name, recipient_id, content, created_at
                        FROM direct_messages
                        WHERE (sender_id = $1 AND recipient_id = $2)
                           OR (sender_id = $2 AND recipient_id = $1)
                        ORDER BY created_at DESC
                        LIMIT $3
                    ) recent
                    ORDER BY created_at ASC
                    ",
                )
                .bind(a)
                .bind(b)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows.into_iter().map(ChatMessage::from).collect())
            }
        }
    }

    async fn insert_message(&self, message: NewMessage) -> Result<ChatMessage> {
        let id = Uuid::new_v4();

        match &message.source {
            MessageSource::Group { channel_id } => {
                let row = sqlx::query_as::<_, GroupRow>(
                    r"
                    INSERT INTO channel_messages (id, channel_id, sender_id, sender_name, content)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, channel_id, sender_id, sender_name, content, created_at
                    ",
                )
                .bind(id)
                .bind(channel_id)
                .bind(&message.author.id)
                .bind(&message.author.name)
                .bind(&message.content)
                .fetch_one(&self.pool)
                .await?;

                Ok(ChatMessage::from(row))
            }
            MessageSource::Direct { recipient_id, .. } => {
                let row = sqlx::query_as::<_, DirectRow>(
                    r"
                    INSERT INTO direct_messages (id, sender_id, sender_name, recipient_id, content)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, sender_id, sender_name, recipient_id, content, created_at
                    ",
                )
                .bind(id)
                .bind(&message.author.id)
                .bind(&message.author.name)
                .bind(recipient_id)
                .bind(&message.content)
                .fetch_one(&self.pool)
                .await?;

                Ok(ChatMessage::from(row))
            }
        }
    }
}
