//! Protocol message types for daemon communication.

use crate::event::BossEventType;
use crate::version::ProtocolVersion;
use bossbar_core::{BarPacket, ClientId, EntityId};
use serde::{Deserialize, Serialize};

/// Message types that clients can send to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageType {
    /// Client handshake/connection request
    Connect {
        /// Display name for logs (optional)
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Boss event originated by the client
    BossEvent {
        /// Event subtype
        event_type: BossEventType,
        /// Player entity the event refers to
        player_id: EntityId,
    },

    /// Free-form text message
    Text {
        message: String,
    },

    /// Ping to check connection
    Ping {
        /// Sequence number for matching pong response
        seq: u64,
    },

    /// Client disconnecting gracefully
    Disconnect,
}

/// Top-level kind of a [`MessageType`], used for handler routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Connect,
    BossEvent,
    Text,
    Ping,
    Disconnect,
}

impl MessageType {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Connect { .. } => MessageKind::Connect,
            Self::BossEvent { .. } => MessageKind::BossEvent,
            Self::Text { .. } => MessageKind::Text,
            Self::Ping { .. } => MessageKind::Ping,
            Self::Disconnect => MessageKind::Disconnect,
        }
    }
}

/// Messages sent from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Protocol version
    pub protocol_version: ProtocolVersion,

    /// Message payload
    #[serde(flatten)]
    pub message: MessageType,
}

impl ClientMessage {
    /// Creates a new client message with current protocol version.
    pub fn new(message: MessageType) -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            message,
        }
    }

    pub fn connect(name: Option<String>) -> Self {
        Self::new(MessageType::Connect { name })
    }

    pub fn boss_event(event_type: BossEventType, player_id: EntityId) -> Self {
        Self::new(MessageType::BossEvent {
            event_type,
            player_id,
        })
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::new(MessageType::Text {
            message: message.into(),
        })
    }

    pub fn ping(seq: u64) -> Self {
        Self::new(MessageType::Ping { seq })
    }

    pub fn disconnect() -> Self {
        Self::new(MessageType::Disconnect)
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}

/// Messages sent from daemon to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection accepted
    Connected {
        /// Daemon's protocol version
        protocol_version: ProtocolVersion,
        /// Assigned client ID
        client_id: ClientId,
    },

    /// Connection rejected (version mismatch, too many clients)
    Rejected {
        reason: String,
        /// Daemon's protocol version (for client to upgrade)
        protocol_version: ProtocolVersion,
    },

    /// Boss bar update
    Bar {
        packet: BarPacket,
    },

    /// Pong response to ping
    Pong {
        seq: u64,
    },

    /// The daemon is closing this session
    Kicked {
        reason: String,
    },

    /// Error response
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl ServerMessage {
    pub fn connected(client_id: ClientId) -> Self {
        Self::Connected {
            protocol_version: ProtocolVersion::CURRENT,
            client_id,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
            protocol_version: ProtocolVersion::CURRENT,
        }
    }

    pub fn bar(packet: BarPacket) -> Self {
        Self::Bar { packet }
    }

    pub fn pong(seq: u64) -> Self {
        Self::Pong { seq }
    }

    pub fn kicked(reason: &str) -> Self {
        Self::Kicked {
            reason: reason.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
            code: None,
        }
    }

    pub fn error_with_code(message: &str, code: &str) -> Self {
        Self::Error {
            message: message.to_string(),
            code: Some(code.to_string()),
        }
    }

    /// Returns true if the connection should close after this message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Kicked { .. } | Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bossbar_core::{BarColor, BarState};

    #[test]
    fn test_client_message_serialization() {
        let msg = ClientMessage::boss_event(BossEventType::RegisterPlayer, EntityId::new(7));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"boss_event\""));
        assert!(json.contains("\"event_type\":\"register_player\""));
        assert!(json.contains("\"player_id\":7"));
        assert!(json.contains("\"protocol_version\""));
    }

    #[test]
    fn test_client_message_parse() {
        let json = r#"{"protocol_version":{"major":1,"minor":0},"type":"text","message":"hi"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind(), MessageKind::Text);
        assert_eq!(msg.message, MessageType::Text { message: "hi".to_string() });
    }

    #[test]
    fn test_server_bar_message_nests_packet() {
        let mut state = BarState::new();
        state.set_color(BarColor::Yellow);
        let msg = ServerMessage::bar(BarPacket::show(EntityId::new(1), "Boss".to_string(), &state));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"bar\""));
        assert!(json.contains("\"event\":\"show\""));
        assert!(json.contains("\"color\":\"yellow\""));

        let parsed: ServerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_terminal_messages() {
        assert!(ServerMessage::kicked("Invalid packet received").is_terminal());
        assert!(ServerMessage::rejected("full").is_terminal());
        assert!(!ServerMessage::pong(1).is_terminal());
    }

    #[test]
    fn test_connected_carries_client_id() {
        let json = serde_json::to_string(&ServerMessage::connected(ClientId::new(12))).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"client_id\":12"));
    }
}
