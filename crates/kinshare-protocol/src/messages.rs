use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{ConnectionId, Role, RoomId};

/// Messages sent from an endpoint to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Bind this connection to a room, optionally declaring a role
    Join {
        room_id: RoomId,
        #[serde(default)]
        role: Option<Role>,
    },

    /// Declare or change the role of this connection
    RegisterRole { role: Role },

    /// Session description offer, directed when `to` is set
    Offer {
        room_id: RoomId,
        sdp: Value,
        #[serde(default, deserialize_with = "lenient_target")]
        to: Option<ConnectionId>,
    },

    /// Session description answer, directed when `to` is set
    Answer {
        room_id: RoomId,
        sdp: Value,
        #[serde(default, deserialize_with = "lenient_target")]
        to: Option<ConnectionId>,
    },

    /// ICE candidate, directed when `to` is set
    Candidate {
        room_id: RoomId,
        candidate: Value,
        #[serde(default, deserialize_with = "lenient_target")]
        to: Option<ConnectionId>,
    },

    /// Stop sharing in the bound room
    StopShare,

    /// Ask for the room's roster and fresh offers from every active child
    GetActiveChildren,

    /// Keepalive
    Ping,
}

impl ClientMessage {
    /// Parse a text frame and check the constraints the type system cannot express.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        let event = self.event_name();
        match self {
            ClientMessage::Join { room_id, .. } => require_room(event, room_id),
            ClientMessage::Offer { room_id, sdp, .. }
            | ClientMessage::Answer { room_id, sdp, .. } => {
                require_room(event, room_id)?;
                require_payload(event, "sdp", sdp)
            }
            ClientMessage::Candidate {
                room_id, candidate, ..
            } => {
                require_room(event, room_id)?;
                require_payload(event, "candidate", candidate)
            }
            ClientMessage::RegisterRole { .. }
            | ClientMessage::StopShare
            | ClientMessage::GetActiveChildren
            | ClientMessage::Ping => Ok(()),
        }
    }

    /// Wire name of the event, as carried in the `type` field
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::RegisterRole { .. } => "register-role",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::Candidate { .. } => "candidate",
            ClientMessage::StopShare => "stop-share",
            ClientMessage::GetActiveChildren => "get-active-children",
            ClientMessage::Ping => "ping",
        }
    }
}

/// Endpoints address peers by whatever id they last saw, so a stale or foreign
/// `to` must not fail the frame. Empty values mean "no target"; anything else that
/// is not a UUID maps to the nil id, which is never assigned and so drops silently.
fn lenient_target<'de, D>(deserializer: D) -> Result<Option<ConnectionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let target = match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(ref s) if s.is_empty() => None,
        Value::String(ref s) => Some(ConnectionId::parse_str(s).unwrap_or(ConnectionId::nil())),
        _ => Some(ConnectionId::nil()),
    };
    Ok(target)
}

fn require_room(event: &'static str, room_id: &str) -> Result<(), ProtocolError> {
    if room_id.trim().is_empty() {
        return Err(ProtocolError::EmptyRoomId { event });
    }
    Ok(())
}

fn require_payload(
    event: &'static str,
    field: &'static str,
    value: &Value,
) -> Result<(), ProtocolError> {
    if value.is_null() {
        return Err(ProtocolError::MissingPayload { event, field });
    }
    Ok(())
}

/// Messages sent from the relay to an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once after accept so the endpoint learns its own identifier
    Connected { connection_id: ConnectionId },

    /// A connection joined the room
    PeerJoined {
        conn_id: ConnectionId,
        role: Option<Role>,
    },

    /// Current roster of actively sharing connections
    ActiveChildren { children: Vec<ConnectionId> },

    /// Ask an active child to negotiate a fresh offer with `to`
    RequestOffer { to: ConnectionId, room_id: RoomId },

    /// Relayed offer
    Offer { sdp: Value, from: ConnectionId },

    /// Relayed answer
    Answer { sdp: Value, from: ConnectionId },

    /// Relayed ICE candidate
    Candidate {
        candidate: Value,
        from: ConnectionId,
    },

    /// A child stopped sharing or disconnected while sharing
    ChildStopped { child_id: ConnectionId },

    /// A connection left the room
    PeerDisconnected { conn_id: ConnectionId },

    /// Pong response to ping
    Pong,

    /// A frame was rejected at the boundary
    Error { message: String },
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{event}: roomId must not be empty")]
    EmptyRoomId { event: &'static str },

    #[error("{event}: missing {field}")]
    MissingPayload {
        event: &'static str,
        field: &'static str,
    },
}
