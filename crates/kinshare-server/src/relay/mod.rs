//! Signaling relay
//!
//! Tracks which children are sharing in each room and relays the offer/answer/ICE
//! handshake between endpoints. Media never passes through here.

mod registry;
mod router;
mod session;

pub use registry::{Room, RoomRegistry};
pub use router::{Outbound, SignalingRouter};
pub use session::{ConnectionSession, SessionState};

use crate::ws::connections::ConnectionManager;
use kinshare_protocol::{ClientMessage, ConnectionId};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serializes every room/session mutation and hands the resulting messages to
/// the connection manager.
pub struct Relay {
    router: Mutex<SignalingRouter>,
    connections: Arc<ConnectionManager>,
}

impl Relay {
    pub fn new(registry: RoomRegistry, connections: Arc<ConnectionManager>) -> Self {
        Self {
            router: Mutex::new(SignalingRouter::new(registry)),
            connections,
        }
    }

    pub async fn handle(&self, session: &mut ConnectionSession, message: ClientMessage) {
        let event = message.event_name();
        let mut router = self.router.lock().await;
        let outbound = router.handle(session, message);

        tracing::debug!(
            "{} from {} produced {} message(s)",
            event,
            session.id(),
            outbound.len()
        );

        // Delivered under the lock so every recipient observes mutation order.
        self.connections.deliver(outbound).await;
    }

    pub async fn disconnect(&self, session: ConnectionSession) {
        let mut router = self.router.lock().await;
        let outbound = router.disconnect(session);
        self.connections.deliver(outbound).await;
    }

    pub async fn roster(&self, room_id: &str) -> Vec<ConnectionId> {
        self.router.lock().await.registry().roster(room_id)
    }

    pub async fn room_count(&self) -> usize {
        self.router.lock().await.registry().len()
    }
}
