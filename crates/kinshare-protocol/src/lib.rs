//! Kinshare signaling protocol
//!
//! Wire types exchanged between endpoints and the signaling relay. Every frame is
//! a JSON object whose `type` field names the event.

mod messages;
mod types;

pub use messages::{ClientMessage, ProtocolError, ServerMessage};
pub use types::{ConnectionId, Role, RoomId};
