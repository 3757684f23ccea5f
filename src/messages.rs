use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Role;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room by name (created implicitly on first join)
    #[serde(rename = "join")]
    Join { room: String },

    /// Relay an opaque negotiation payload to the other occupant
    #[serde(rename = "signal")]
    Signal { room: String, payload: Value },

    /// Leave the current room
    #[serde(rename = "leave")]
    Leave { room: String },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Joined the room successfully, with the assigned role
    #[serde(rename = "joined")]
    Joined { room: String, role: Role },

    /// Join rejected: the room already has two occupants
    #[serde(rename = "room_full")]
    RoomFull { room: String },

    /// The other occupant arrived
    #[serde(rename = "peer_joined")]
    PeerJoined { room: String },

    /// Sent to the initiator once the room holds two occupants
    #[serde(rename = "start_negotiation")]
    StartNegotiation { room: String },

    /// Opaque payload relayed from the other occupant
    #[serde(rename = "signal")]
    Signal { payload: Value },

    /// The other occupant left or disconnected
    #[serde(rename = "peer_left")]
    PeerLeft { room: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_join() {
        let json = r#"{"type": "join", "room": "lobby"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ClientMessage::Join { room: "lobby".into() });
    }

    #[test]
    fn parse_signal() {
        let json = r#"{"type": "signal", "room": "lobby", "payload": {"sdp": "v=0"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Signal {
                room: "lobby".into(),
                payload: json!({"sdp": "v=0"}),
            }
        );
    }

    #[test]
    fn parse_leave() {
        let json = r#"{"type": "leave", "room": "lobby"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ClientMessage::Leave { room: "lobby".into() });
    }

    #[test]
    fn parse_join_missing_room_fails() {
        let json = r#"{"type": "join"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn parse_unknown_type_fails() {
        let json = r#"{"type": "dance", "room": "lobby"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn parse_invalid_json_fails() {
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn serialize_joined() {
        let msg = ServerMessage::Joined {
            room: "lobby".into(),
            role: Role::Initiator,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"joined\""));
        assert!(json.contains("\"initiator\""));
        assert!(json.contains("lobby"));
    }

    #[test]
    fn serialize_room_full() {
        let msg = ServerMessage::RoomFull { room: "lobby".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("room_full"));
        assert!(json.contains("lobby"));
    }

    #[test]
    fn serialize_peer_joined() {
        let msg = ServerMessage::PeerJoined { room: "lobby".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("peer_joined"));
    }

    #[test]
    fn serialize_start_negotiation() {
        let msg = ServerMessage::StartNegotiation { room: "lobby".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("start_negotiation"));
    }

    #[test]
    fn serialize_signal_preserves_payload() {
        let msg = ServerMessage::Signal {
            payload: json!({"candidate": "udp 1234", "nested": [1, 2, 3]}),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn serialize_peer_left() {
        let msg = ServerMessage::PeerLeft { room: "lobby".into() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("peer_left"));
    }
}
