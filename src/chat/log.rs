//! In-memory ordered message list with identity-based deduplication

use uuid::Uuid;

use crate::models::ChatMessage;

/// Ordered message list for one open room.
///
/// Invariant: each message id appears at most once, for both the initial
/// history merge and every subsequent push event, regardless of
/// re-subscription or replay.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message at its timeline position unless its id is already
    /// present; returns whether it was inserted
    pub fn insert(&mut self, message: ChatMessage) -> bool {
        if self.contains(message.id) {
            return false;
        }

        // Keep created_at order; equal timestamps append after existing ones
        let position = self
            .entries
            .iter()
            .rposition(|m| m.created_at <= message.created_at)
            .map_or(0, |idx| idx + 1);
        self.entries.insert(position, message);
        true
    }

    /// Merge a historical load through the same dedup path, so pushes that
    /// arrived before the history resolved are never duplicated
    pub fn merge_history(&mut self, history: Vec<ChatMessage>) -> usize {
        history
            .into_iter()
            .filter(|m| self.insert(m.clone()))
            .count()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.entries.iter().any(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::models::{Identity, MessageSource};

    fn message(id: Uuid, offset_secs: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            content: content.to_string(),
            author: Identity {
                id: "user1".to_string(),
                name: "User One".to_string(),
            },
            created_at: Utc::now() + Duration::seconds(offset_secs),
            source: MessageSource::Group {
                channel_id: "general".to_string(),
            },
        }
    }

    #[test]
    fn test_duplicate_ids_inserted_once() {
        let id = Uuid::new_v4();
        let mut log = MessageLog::new();

        assert!(log.insert(message(id, 0, "hello")));
        assert!(!log.insert(message(id, 1, "hello again")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_push_before_history_merge_dedupes() {
        let shared = Uuid::new_v4();
        let mut log = MessageLog::new();

        // push event lands before history resolves
        log.insert(message(shared, 5, "pushed"));

        let history = vec![
            message(Uuid::new_v4(), 1, "older"),
            message(shared, 5, "pushed"),
            message(Uuid::new_v4(), 3, "middle"),
        ];
        let merged = log.merge_history(history);

        assert_eq!(merged, 2);
        assert_eq!(log.len(), 3);
        assert_eq!(log.messages().iter().filter(|m| m.id == shared).count(), 1);
    }

    #[test]
    fn test_timeline_order_after_out_of_order_inserts() {
        let mut log = MessageLog::new();
        log.insert(message(Uuid::new_v4(), 10, "third"));
        log.insert(message(Uuid::new_v4(), 0, "first"));
        log.insert(message(Uuid::new_v4(), 5, "second"));

        let contents: Vec<_> = log.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_replay_interleavings_keep_each_id_once() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut log = MessageLog::new();

        // history, replayed pushes, then the same history again
        log.merge_history(ids.iter().enumerate().map(|(i, &id)| message(id, i as i64, "m")).collect());
        for &id in &ids {
            log.insert(message(id, 99, "replayed"));
        }
        log.merge_history(ids.iter().enumerate().map(|(i, &id)| message(id, i as i64, "m")).collect());

        assert_eq!(log.len(), ids.len());
        for &id in &ids {
            assert_eq!(log.messages().iter().filter(|m| m.id == id).count(), 1);
        }
    }
}
