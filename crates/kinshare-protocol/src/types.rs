use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to a connection when the relay accepts it
pub type ConnectionId = Uuid;

/// Opaque room key chosen by the endpoints
pub type RoomId = String;

/// Role a connection declares inside its room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Observes the streams of the room's children
    Admin,
    /// Originates a stream
    Child,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Child => f.write_str("child"),
        }
    }
}
