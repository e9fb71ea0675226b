use crate::relay::Outbound;
use kinshare_protocol::{ConnectionId, ServerMessage};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};

pub struct ConnectionManager {
    /// Map from connection ID to message sender channel
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_connection(
        &self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
    ) {
        self.senders.write().await.insert(connection_id, sender);
        tracing::debug!("Connection {} registered", connection_id);
    }

    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        if self.senders.write().await.remove(&connection_id).is_some() {
            tracing::debug!("Connection {} unregistered", connection_id);
        }
    }

    /// Sending to an unknown connection is a no-op.
    pub async fn send_to_connection(&self, connection_id: ConnectionId, message: &ServerMessage) {
        let json = match serde_json::to_string(message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!("Failed to serialize message: {}", e);
                return;
            }
        };

        let senders = self.senders.read().await;
        send_json(&senders, connection_id, json);
    }

    /// Deliver a batch in order, holding the sender map once for the whole batch.
    pub async fn deliver(&self, outbound: Vec<Outbound>) {
        if outbound.is_empty() {
            return;
        }

        let senders = self.senders.read().await;
        for Outbound { recipient, message } in outbound {
            match serde_json::to_string(&message) {
                Ok(json) => send_json(&senders, recipient, json),
                Err(e) => tracing::error!("Failed to serialize message: {}", e),
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

fn send_json(
    senders: &HashMap<ConnectionId, mpsc::UnboundedSender<String>>,
    connection_id: ConnectionId,
    json: String,
) {
    match senders.get(&connection_id) {
        Some(sender) => {
            if let Err(e) = sender.send(json) {
                tracing::error!("Failed to send message to {}: {}", connection_id, e);
            }
        }
        None => tracing::debug!("Dropping message for unknown connection {}", connection_id),
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
