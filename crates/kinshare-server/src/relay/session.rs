use kinshare_protocol::{ConnectionId, Role, RoomId};
use std::collections::BTreeSet;

/// Where a connection sits in the relay's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    Unjoined,
    Joined {
        room_id: &'a str,
        role: Option<Role>,
    },
}

/// Per-connection state, owned by the connection handler and passed into every
/// router call.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    id: ConnectionId,
    room_id: Option<RoomId>,
    role: Option<Role>,
    /// Rooms whose active roster currently lists this connection
    active_rooms: BTreeSet<RoomId>,
}

impl ConnectionSession {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            room_id: None,
            role: None,
            active_rooms: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn state(&self) -> SessionState<'_> {
        match self.room_id.as_deref() {
            Some(room_id) => SessionState::Joined {
                room_id,
                role: self.role,
            },
            None => SessionState::Unjoined,
        }
    }

    /// Local mirror of this connection's presence in any active roster.
    pub fn sharing_active(&self) -> bool {
        !self.active_rooms.is_empty()
    }

    pub(crate) fn bind_room(&mut self, room_id: RoomId) -> Option<RoomId> {
        self.room_id.replace(room_id)
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    pub(crate) fn mark_active(&mut self, room_id: &str) {
        self.active_rooms.insert(room_id.to_string());
    }

    pub(crate) fn clear_active(&mut self, room_id: &str) -> bool {
        self.active_rooms.remove(room_id)
    }

    pub(crate) fn take_active_rooms(&mut self) -> BTreeSet<RoomId> {
        std::mem::take(&mut self.active_rooms)
    }
}
