//! Chat event wire types
//!
//! The contract between the broadcast hub and its message producers and
//! consumers: every event carries a discriminant, a room identifier, the
//! acting user, and an arbitrary JSON payload. The serialized form is
//! consumed directly by connected chat clients, so the field names and
//! discriminant spellings are load-bearing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat room identifier (relational store row id)
pub type RoomId = i64;

/// User account identifier (relational store row id)
pub type UserId = i64;

/// Event discriminant, serialized as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// New chat message persisted and fanned out
    Message,
    /// Read receipt for previously delivered messages
    Read,
    /// User joined the room's membership
    MemberJoin,
    /// User left the room's membership
    MemberLeave,
    /// User's connection came online
    MemberOnline,
    /// User's connection went offline
    MemberOffline,
}

/// A single room-scoped chat event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub data: Value,
}

impl ChatEvent {
    pub fn new(kind: EventKind, room_id: RoomId, user_id: UserId, data: Value) -> Self {
        Self {
            kind,
            room_id,
            user_id,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_wire_format_is_stable() {
        let event = ChatEvent::new(
            EventKind::Message,
            7,
            42,
            json!({ "message": "hello", "message_type": "text" }),
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["room_id"], 7);
        assert_eq!(value["user_id"], 42);
        assert_eq!(value["data"]["message"], "hello");
    }

    #[test]
    fn presence_discriminants_serialize_snake_case() {
        for (kind, expected) in [
            (EventKind::Read, "read"),
            (EventKind::MemberJoin, "member_join"),
            (EventKind::MemberLeave, "member_leave"),
            (EventKind::MemberOnline, "member_online"),
            (EventKind::MemberOffline, "member_offline"),
        ] {
            let event = ChatEvent::new(kind, 1, 2, json!({}));
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], expected);
        }
    }

    #[test]
    fn event_roundtrips_through_bytes() {
        let event = ChatEvent::new(EventKind::MemberOnline, 3, 9, json!({ "status": "online" }));
        let bytes = serde_json::to_vec(&event).unwrap();
        let parsed: ChatEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, event);
    }
}
