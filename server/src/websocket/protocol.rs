//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and tagged by `type`.

use reelrack_engine::CatalogRecord;
use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh snapshot.
    Refresh,

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The whole collection, newest creation first.
    Snapshot { records: Vec<CatalogRecord> },

    /// Response to ping.
    Pong,

    /// Error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn snapshot(records: Vec<CatalogRecord>) -> Self {
        ServerMessage::Snapshot { records }
    }

    /// Create an error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelrack_engine::{Kind, RecordFields};

    #[test]
    fn test_client_message_deserialization() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "refresh"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Refresh));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "push"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);

        let json = serde_json::to_string(&ServerMessage::error("bad frame")).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"bad frame"}"#);

        let record = CatalogRecord::new("t-1", RecordFields::new("Dune", Kind::Movie, 2021), None, 5);
        let value = serde_json::to_value(ServerMessage::snapshot(vec![record])).unwrap();
        assert_eq!(value["type"], "snapshot");
        assert_eq!(value["records"][0]["id"], "t-1");
        assert_eq!(value["records"][0]["title"], "Dune");
    }
}
