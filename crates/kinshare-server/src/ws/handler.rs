use crate::relay::ConnectionSession;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use kinshare_protocol::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outbound messages
    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.connections.add_connection(connection_id, tx).await;
    state
        .connections
        .send_to_connection(connection_id, &ServerMessage::Connected { connection_id })
        .await;

    tracing::info!(
        "Connection {} opened ({} connected)",
        connection_id,
        state.connections.connection_count().await
    );

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = ConnectionSession::new(connection_id);

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match ClientMessage::decode(text.as_str()) {
                Ok(message) => state.relay.handle(&mut session, message).await,
                Err(e) => {
                    tracing::warn!("Rejected frame from {}: {}", connection_id, e);
                    state
                        .connections
                        .send_to_connection(
                            connection_id,
                            &ServerMessage::Error {
                                message: e.to_string(),
                            },
                        )
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!("WebSocket error for connection {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    // Cleanup on disconnect
    state.relay.disconnect(session).await;
    state.connections.remove_connection(connection_id).await;
    send_task.abort();

    tracing::info!("Connection {} closed", connection_id);
}
