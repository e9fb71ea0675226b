//! Signaling router
//!
//! Applies one inbound event to the room registry and the sender's session, and
//! computes who receives what. Handlers never fail: events that do not apply to
//! the session's current state are dropped without effect.

use super::registry::RoomRegistry;
use super::session::{ConnectionSession, SessionState};
use kinshare_protocol::{ClientMessage, ConnectionId, Role, RoomId, ServerMessage};
use serde_json::Value;

/// A message addressed to exactly one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: ConnectionId,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(recipient: ConnectionId, message: ServerMessage) -> Self {
        Self { recipient, message }
    }
}

pub struct SignalingRouter {
    registry: RoomRegistry,
}

impl SignalingRouter {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn handle(
        &mut self,
        session: &mut ConnectionSession,
        message: ClientMessage,
    ) -> Vec<Outbound> {
        let mut out = Vec::new();

        match message {
            ClientMessage::Join { room_id, role } => {
                self.join(session, room_id, role, &mut out);
            }
            ClientMessage::RegisterRole { role } => {
                session.set_role(role);
                if let SessionState::Joined { room_id, .. } = session.state() {
                    self.registry.add_member(room_id, session.id(), Some(role));
                }
                tracing::debug!("Connection {} registered as {}", session.id(), role);
            }
            ClientMessage::Offer { room_id, sdp, to } => {
                self.offer(session, room_id, sdp, to, &mut out);
            }
            ClientMessage::Answer { room_id, sdp, to } => {
                let from = session.id();
                self.relay(&room_id, from, to, ServerMessage::Answer { sdp, from }, &mut out);
            }
            ClientMessage::Candidate {
                room_id,
                candidate,
                to,
            } => {
                let from = session.id();
                self.relay(
                    &room_id,
                    from,
                    to,
                    ServerMessage::Candidate { candidate, from },
                    &mut out,
                );
            }
            ClientMessage::StopShare => {
                self.stop_share(session, &mut out);
            }
            ClientMessage::GetActiveChildren => match session.state() {
                SessionState::Joined { room_id, .. } => {
                    self.solicit(room_id, session.id(), &mut out)
                }
                SessionState::Unjoined => {
                    tracing::debug!(
                        "Ignoring get-active-children from unjoined connection {}",
                        session.id()
                    );
                }
            },
            ClientMessage::Ping => out.push(Outbound::new(session.id(), ServerMessage::Pong)),
        }

        out
    }

    /// Cleanup cascade for a closed connection. Consumes the session.
    ///
    /// Every room that listed the connection as active gets `child-stopped` before
    /// the bound room gets `peer-disconnected`.
    pub fn disconnect(&mut self, mut session: ConnectionSession) -> Vec<Outbound> {
        let mut out = Vec::new();
        let id = session.id();
        let active_rooms = session.take_active_rooms();

        if let SessionState::Joined { room_id, .. } = session.state() {
            self.registry.remove_connection(room_id, id);
        }

        for room_id in &active_rooms {
            self.registry.deactivate(room_id, id);
            self.broadcast(room_id, ServerMessage::ChildStopped { child_id: id }, &mut out);
        }

        if let SessionState::Joined { room_id, .. } = session.state() {
            self.broadcast(room_id, ServerMessage::PeerDisconnected { conn_id: id }, &mut out);
            tracing::debug!("Connection {} left room {}", id, room_id);
        }

        out
    }

    fn join(
        &mut self,
        session: &mut ConnectionSession,
        room_id: RoomId,
        role: Option<Role>,
        out: &mut Vec<Outbound>,
    ) {
        let id = session.id();

        if let Some(previous) = session.bind_room(room_id.clone()) {
            if previous != room_id {
                self.leave(session, &previous, out);
            }
        }

        if let Some(role) = role {
            session.set_role(role);
        }

        self.registry.join(&room_id, id);
        self.registry.add_member(&room_id, id, session.role());
        tracing::debug!(
            "Connection {} joined room {} (role: {:?})",
            id,
            room_id,
            session.role()
        );

        self.broadcast(
            &room_id,
            ServerMessage::PeerJoined {
                conn_id: id,
                role: session.role(),
            },
            out,
        );

        if session.role() == Some(Role::Admin) {
            self.solicit(&room_id, id, out);
        }
    }

    /// Drop out of a room the session is no longer bound to.
    fn leave(&mut self, session: &mut ConnectionSession, room_id: &str, out: &mut Vec<Outbound>) {
        let id = session.id();
        session.clear_active(room_id);

        if self.registry.remove_connection(room_id, id) {
            self.broadcast(room_id, ServerMessage::ChildStopped { child_id: id }, out);
        }
        self.broadcast(room_id, ServerMessage::PeerDisconnected { conn_id: id }, out);
    }

    fn offer(
        &mut self,
        session: &mut ConnectionSession,
        room_id: RoomId,
        sdp: Value,
        to: Option<ConnectionId>,
        out: &mut Vec<Outbound>,
    ) {
        let from = session.id();

        // Any offer activates the sender, whatever role it declared.
        session.mark_active(&room_id);
        self.registry.activate(&room_id, from);

        let children = self.registry.roster(&room_id);
        self.broadcast(&room_id, ServerMessage::ActiveChildren { children }, out);
        self.relay(&room_id, from, to, ServerMessage::Offer { sdp, from }, out);
    }

    fn stop_share(&mut self, session: &mut ConnectionSession, out: &mut Vec<Outbound>) {
        let id = session.id();

        for room_id in session.take_active_rooms() {
            self.registry.deactivate(&room_id, id);
            self.broadcast(&room_id, ServerMessage::ChildStopped { child_id: id }, out);

            let children = self.registry.roster(&room_id);
            self.broadcast(&room_id, ServerMessage::ActiveChildren { children }, out);
            tracing::debug!("Connection {} stopped sharing in room {}", id, room_id);
        }
    }

    /// Send the roster to `admin` and ask every active child for a fresh offer
    /// addressed to it.
    fn solicit(&self, room_id: &str, admin: ConnectionId, out: &mut Vec<Outbound>) {
        let children = self.registry.roster(room_id);

        out.push(Outbound::new(
            admin,
            ServerMessage::ActiveChildren {
                children: children.clone(),
            },
        ));

        for child in children {
            out.push(Outbound::new(
                child,
                ServerMessage::RequestOffer {
                    to: admin,
                    room_id: room_id.to_string(),
                },
            ));
        }
    }

    /// Directed when `to` is set, otherwise every other member of the room.
    fn relay(
        &self,
        room_id: &str,
        from: ConnectionId,
        to: Option<ConnectionId>,
        message: ServerMessage,
        out: &mut Vec<Outbound>,
    ) {
        match to {
            Some(target) => out.push(Outbound::new(target, message)),
            None => {
                for member in self.registry.members_except(room_id, Some(from)) {
                    out.push(Outbound::new(member, message.clone()));
                }
            }
        }
    }

    fn broadcast(&self, room_id: &str, message: ServerMessage, out: &mut Vec<Outbound>) {
        for member in self.registry.members_except(room_id, None) {
            out.push(Outbound::new(member, message.clone()));
        }
    }
}
