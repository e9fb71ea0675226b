//! Room registry
//!
//! Owns every room's membership sets. Nothing else mutates a [`Room`]; sessions
//! refer to rooms by id only.

use kinshare_protocol::{ConnectionId, Role, RoomId};
use std::collections::{BTreeSet, HashMap};

/// Membership state of a single room
#[derive(Debug, Default, Clone)]
pub struct Room {
    /// Every connection that joined the room, regardless of role
    pub members: BTreeSet<ConnectionId>,
    pub admins: BTreeSet<ConnectionId>,
    pub children: BTreeSet<ConnectionId>,
    /// Connections that sent an offer here and have not stopped or disconnected.
    /// Not required to be a subset of `children`.
    pub active_children: BTreeSet<ConnectionId>,
}

impl Room {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
            && self.admins.is_empty()
            && self.children.is_empty()
            && self.active_children.is_empty()
    }

    pub fn roster(&self) -> Vec<ConnectionId> {
        self.active_children.iter().copied().collect()
    }
}

/// Process-wide map from room id to [`Room`]
///
/// Every operation is infallible: an absent room or member is treated as an
/// already satisfied postcondition.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    evict_empty: bool,
}

impl RoomRegistry {
    pub fn new(evict_empty: bool) -> Self {
        Self {
            rooms: HashMap::new(),
            evict_empty,
        }
    }

    /// Get-or-create
    pub fn ensure_room(&mut self, room_id: &str) -> &mut Room {
        if !self.rooms.contains_key(room_id) {
            tracing::debug!("Creating room {}", room_id);
        }
        self.rooms.entry(room_id.to_string()).or_default()
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Put a connection in the room's broadcast scope.
    pub fn join(&mut self, room_id: &str, connection_id: ConnectionId) {
        self.ensure_room(room_id).members.insert(connection_id);
    }

    /// Register a role. Admins and children stay disjoint, so a role toggle moves
    /// the connection from one set to the other. `None` is a no-op.
    pub fn add_member(&mut self, room_id: &str, connection_id: ConnectionId, role: Option<Role>) {
        let Some(role) = role else {
            return;
        };

        let room = self.ensure_room(room_id);
        match role {
            Role::Admin => {
                room.children.remove(&connection_id);
                room.admins.insert(connection_id);
            }
            Role::Child => {
                room.admins.remove(&connection_id);
                room.children.insert(connection_id);
            }
        }
    }

    pub fn activate(&mut self, room_id: &str, connection_id: ConnectionId) {
        self.ensure_room(room_id).active_children.insert(connection_id);
    }

    /// Returns whether the connection had been active.
    pub fn deactivate(&mut self, room_id: &str, connection_id: ConnectionId) -> bool {
        let removed = self
            .rooms
            .get_mut(room_id)
            .map(|room| room.active_children.remove(&connection_id))
            .unwrap_or(false);

        self.evict_if_empty(room_id);
        removed
    }

    /// Remove a connection from every set of the room. Returns whether it had been
    /// in the active roster.
    pub fn remove_connection(&mut self, room_id: &str, connection_id: ConnectionId) -> bool {
        let was_active = match self.rooms.get_mut(room_id) {
            Some(room) => {
                room.members.remove(&connection_id);
                room.admins.remove(&connection_id);
                room.children.remove(&connection_id);
                room.active_children.remove(&connection_id)
            }
            None => false,
        };

        self.evict_if_empty(room_id);
        was_active
    }

    /// Sorted snapshot of the room's active children; empty for unknown rooms.
    pub fn roster(&self, room_id: &str) -> Vec<ConnectionId> {
        self.rooms.get(room_id).map(Room::roster).unwrap_or_default()
    }

    /// Broadcast scope of the room, minus `except` when given.
    pub fn members_except(
        &self,
        room_id: &str,
        except: Option<ConnectionId>,
    ) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| {
                room.members
                    .iter()
                    .copied()
                    .filter(|id| Some(*id) != except)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn evict_if_empty(&mut self, room_id: &str) {
        if !self.evict_empty {
            return;
        }

        if self.rooms.get(room_id).is_some_and(Room::is_empty) {
            self.rooms.remove(room_id);
            tracing::debug!("Evicted empty room {}", room_id);
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ensure_room_is_idempotent() {
        let mut registry = RoomRegistry::default();
        let id = Uuid::new_v4();

        registry.ensure_room("fam").members.insert(id);
        registry.ensure_room("fam");

        assert_eq!(registry.len(), 1);
        assert!(registry.room("fam").unwrap().members.contains(&id));
    }

    #[test]
    fn test_add_member_keeps_roles_disjoint() {
        let mut registry = RoomRegistry::default();
        let id = Uuid::new_v4();

        registry.add_member("fam", id, Some(Role::Admin));
        registry.add_member("fam", id, Some(Role::Child));

        let room = registry.room("fam").unwrap();
        assert!(room.children.contains(&id));
        assert!(!room.admins.contains(&id));
    }

    #[test]
    fn test_add_member_without_role_is_noop() {
        let mut registry = RoomRegistry::default();
        registry.add_member("fam", Uuid::new_v4(), None);
        assert!(registry.room("fam").is_none());
    }

    #[test]
    fn test_activation_does_not_require_child_role() {
        let mut registry = RoomRegistry::default();
        let admin = Uuid::new_v4();

        registry.add_member("fam", admin, Some(Role::Admin));
        registry.activate("fam", admin);
        registry.activate("fam", admin);

        assert_eq!(registry.roster("fam"), vec![admin]);
    }

    #[test]
    fn test_deactivate_absent_is_harmless() {
        let mut registry = RoomRegistry::default();
        assert!(!registry.deactivate("nowhere", Uuid::new_v4()));

        let id = Uuid::new_v4();
        registry.join("fam", id);
        registry.activate("fam", id);
        assert!(registry.deactivate("fam", id));
        assert!(!registry.deactivate("fam", id));
        assert!(registry.roster("fam").is_empty());
    }

    #[test]
    fn test_remove_connection_reports_activity() {
        let mut registry = RoomRegistry::default();
        let child = Uuid::new_v4();
        let admin = Uuid::new_v4();

        registry.join("fam", child);
        registry.add_member("fam", child, Some(Role::Child));
        registry.activate("fam", child);
        registry.join("fam", admin);
        registry.add_member("fam", admin, Some(Role::Admin));

        assert!(registry.remove_connection("fam", child));
        assert!(!registry.remove_connection("fam", admin));
        assert!(!registry.remove_connection("fam", admin));
    }

    #[test]
    fn test_empty_room_is_evicted() {
        let mut registry = RoomRegistry::new(true);
        let id = Uuid::new_v4();

        registry.join("fam", id);
        registry.activate("fam", id);
        registry.remove_connection("fam", id);

        assert!(registry.room("fam").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_room_kept_without_eviction() {
        let mut registry = RoomRegistry::new(false);
        let id = Uuid::new_v4();

        registry.join("fam", id);
        registry.remove_connection("fam", id);

        assert!(registry.room("fam").unwrap().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_members_except_excludes_sender() {
        let mut registry = RoomRegistry::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        registry.join("fam", a);
        registry.join("fam", b);

        assert_eq!(registry.members_except("fam", Some(a)), vec![b]);
        assert_eq!(registry.members_except("fam", None).len(), 2);
        assert!(registry.members_except("other", None).is_empty());
    }
}
