use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document lifecycle status; only active documents are searched or backfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Active,
    Inactive,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Active => "active",
            DocumentStatus::Inactive => "inactive",
        }
    }
}

impl From<&str> for DocumentStatus {
    fn from(value: &str) -> Self {
        match value {
            "inactive" => DocumentStatus::Inactive,
            _ => DocumentStatus::Active,
        }
    }
}

/// Stored knowledge-base document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub content: String,
    pub document_type: String,
    pub metadata: serde_json::Value,
    pub status: DocumentStatus,
    /// Absent until the backfill queue or upload path computes it
    pub embedding: Option<Vec<f32>>,
}

/// An active document still waiting for its embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDocument {
    pub id: Uuid,
    pub content: String,
}

/// A document returned by similarity search, transient per query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMatch {
    pub id: Uuid,
    pub name: String,
    pub document_type: String,
    pub source: String,
    pub content: String,
    /// Cosine similarity in [0, 1]
    pub similarity: f32,
    pub metadata: serde_json::Value,
}

/// Result of query enhancement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedQuery {
    pub enhanced_prompt: String,
    pub documents_found: usize,
    pub has_context: bool,
    /// Populated when enhancement degraded to the original query
    pub error: Option<String>,
}

impl EnhancedQuery {
    /// Degraded fallback: the original query passes through unchanged
    pub fn degraded(query: &str, error: String) -> Self {
        Self {
            enhanced_prompt: query.to_string(),
            documents_found: 0,
            has_context: false,
            error: Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Authenticated caller identity, provided by the surrounding app's session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

/// Session handle used to stamp authorship and gate sends
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    pub fn authenticated(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identity: Some(Identity {
                id: id.into(),
                name: name.into(),
            }),
        }
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

/// Backing store for a chat message: group channel or direct-message pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageSource {
    Group { channel_id: String },
    Direct { sender_id: String, recipient_id: String },
}

/// A chat message, immutable once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
    pub source: MessageSource,
}

/// A message about to be written by the send path
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub content: String,
    pub author: Identity,
    pub source: MessageSource,
}

/// Connection state of an open chat view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Live push unavailable; sends still go through direct writes
    ConnectedBroadcastFallback,
    Disconnected,
    AuthError,
}

impl ConnectionState {
    /// The UI treats broadcast fallback as connected
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::ConnectedBroadcastFallback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_enhancement_passes_query_through() {
        let degraded = EnhancedQuery::degraded("what is the refund policy?", "boom".to_string());
        assert_eq!(degraded.enhanced_prompt, "what is the refund policy?");
        assert_eq!(degraded.documents_found, 0);
        assert!(!degraded.has_context);
        assert!(degraded.is_degraded());
    }

    #[test]
    fn test_connection_state_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(ConnectionState::ConnectedBroadcastFallback.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(!ConnectionState::AuthError.is_connected());
    }

    #[test]
    fn test_document_status_round_trip() {
        assert_eq!(DocumentStatus::from("active"), DocumentStatus::Active);
        assert_eq!(DocumentStatus::from("inactive"), DocumentStatus::Inactive);
        assert_eq!(DocumentStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_message_source_tagged_serialization() {
        let source = MessageSource::Direct {
            sender_id: "user1".to_string(),
            recipient_id: "user2".to_string(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["kind"], "direct");
        assert_eq!(json["sender_id"], "user1");
    }
}
