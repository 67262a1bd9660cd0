//! Room identity: group channels and direct-message pairs

use serde::Deserialize;
use serde::Serialize;

use crate::models::MessageSource;

/// Logical chat room: a group channel or a direct-message pair.
///
/// Direct rooms are canonical: the participant pair is sorted, so both
/// participants resolve to the same room id regardless of who opened it.
/// Participant ids are opaque tokens that may not contain `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomId {
    Group(String),
    Direct { a: String, b: String },
}

impl RoomId {
    /// Create a group room
    pub fn group(channel_id: impl Into<String>) -> Self {
        RoomId::Group(channel_id.into())
    }

    /// Create a canonical direct room from a participant pair in any order
    pub fn direct(x: impl Into<String>, y: impl Into<String>) -> Self {
        let x = x.into();
        let y = y.into();
        if x <= y {
            RoomId::Direct { a: x, b: y }
        } else {
            RoomId::Direct { a: y, b: x }
        }
    }

    /// Parse a room id string; `dm-<a>-<b>` encodes a direct pair, anything
    /// else is a group channel id
    pub fn parse(raw: &str) -> Self {
        if let Some(pair) = raw.strip_prefix("dm-") {
            if let Some((x, y)) = pair.split_once('-') {
                if !x.is_empty() && !y.is_empty() {
                    return RoomId::direct(x, y);
                }
            }
        }
        RoomId::Group(raw.to_string())
    }

    /// Canonical string form
    pub fn canonical(&self) -> String {
        match self {
            RoomId::Group(channel_id) => channel_id.clone(),
            RoomId::Direct { a, b } => format!("dm-{a}-{b}"),
        }
    }

    /// Whether a message belongs to this room; direct pairs are checked in
    /// both orientations
    pub fn contains(&self, source: &MessageSource) -> bool {
        match (self, source) {
            (RoomId::Group(channel_id), MessageSource::Group { channel_id: other }) => {
                channel_id == other
            }
            (
                RoomId::Direct { a, b },
                MessageSource::Direct {
                    sender_id,
                    recipient_id,
                },
            ) => {
                (sender_id == a && recipient_id == b) || (sender_id == b && recipient_id == a)
            }
            _ => false,
        }
    }

    /// Build the store record shape for a message sent to this room
    pub fn message_source(&self, sender_id: &str) -> MessageSource {
        match self {
            RoomId::Group(channel_id) => MessageSource::Group {
                channel_id: channel_id.clone(),
            },
            RoomId::Direct { a, b } => {
                let recipient = if sender_id == a { b } else { a };
                MessageSource::Direct {
                    sender_id: sender_id.to_string(),
                    recipient_id: recipient.clone(),
                }
            }
        }
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_room_is_order_independent() {
        assert_eq!(RoomId::direct("user1", "user2"), RoomId::direct("user2", "user1"));
        assert_eq!(
            RoomId::direct("zoe", "amy").canonical(),
            RoomId::direct("amy", "zoe").canonical()
        );
        assert_eq!(RoomId::direct("amy", "zoe").canonical(), "dm-amy-zoe");
    }

    #[test]
    fn test_parse_direct_and_group() {
        assert_eq!(RoomId::parse("dm-user1-user2"), RoomId::direct("user1", "user2"));
        assert_eq!(RoomId::parse("general"), RoomId::group("general"));
        // malformed dm prefix falls back to a group channel id
        assert_eq!(RoomId::parse("dm-only"), RoomId::group("dm-only"));
    }

    #[test]
    fn test_contains_checks_both_orientations() {
        let room = RoomId::direct("user1", "user2");
        let forward = MessageSource::Direct {
            sender_id: "user1".to_string(),
            recipient_id: "user2".to_string(),
        };
        let reverse = MessageSource::Direct {
            sender_id: "user2".to_string(),
            recipient_id: "user1".to_string(),
        };
        let other = MessageSource::Direct {
            sender_id: "user1".to_string(),
            recipient_id: "user3".to_string(),
        };

        assert!(room.contains(&forward));
        assert!(room.contains(&reverse));
        assert!(!room.contains(&other));
    }

    #[test]
    fn test_group_room_ignores_direct_messages() {
        let room = RoomId::group("support");
        let direct = MessageSource::Direct {
            sender_id: "user1".to_string(),
            recipient_id: "user2".to_string(),
        };
        assert!(!room.contains(&direct));
        assert!(room.contains(&MessageSource::Group {
            channel_id: "support".to_string()
        }));
    }

    #[test]
    fn test_message_source_picks_the_other_participant() {
        let room = RoomId::direct("user1", "user2");
        let source = room.message_source("user2");
        assert_eq!(
            source,
            MessageSource::Direct {
                sender_id: "user2".to_string(),
                recipient_id: "user1".to_string(),
            }
        );
    }
}
