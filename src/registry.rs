use std::collections::HashMap;

use crate::types::{ParticipantId, Role, SignalingError};

/// Hard cap on room membership: one initiator, one responder
pub(crate) const ROOM_CAPACITY: usize = 2;

/// Occupants in join order; the order determines role assignment
#[derive(Debug, Default)]
pub(crate) struct Room {
    pub occupants: Vec<ParticipantId>,
}

/// Owns the name -> Room mapping; the sole mutator of room membership.
/// Emptied rooms are removed, so a fresh join to the same name restarts
/// role numbering at initiator.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    rooms: HashMap<String, Room>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the room for `name`
    pub fn ensure_room(&mut self, name: &str) -> &mut Room {
        self.rooms.entry(name.to_string()).or_default()
    }

    /// Append a participant and assign its role by arrival order.
    /// Fails when the room already holds two occupants.
    pub fn add_occupant(
        &mut self,
        name: &str,
        id: ParticipantId,
    ) -> Result<Role, SignalingError> {
        let room = self.ensure_room(name);
        if room.occupants.len() >= ROOM_CAPACITY {
            return Err(SignalingError::RoomFull(name.to_string()));
        }
        room.occupants.push(id);
        Ok(if room.occupants.len() == 1 {
            Role::Initiator
        } else {
            Role::Responder
        })
    }

    /// Remove a participant if present; no-op otherwise.
    /// Drops the room entry once it is empty.
    pub fn remove_occupant(&mut self, name: &str, id: ParticipantId) {
        if let Some(room) = self.rooms.get_mut(name) {
            room.occupants.retain(|&p| p != id);
            if room.occupants.is_empty() {
                self.rooms.remove(name);
            }
        }
    }

    /// The occupant of `name` that is not `id`, if the room holds two
    pub fn other_occupant(&self, name: &str, id: ParticipantId) -> Option<ParticipantId> {
        self.rooms
            .get(name)?
            .occupants
            .iter()
            .copied()
            .find(|&p| p != id)
    }

    /// Read-only membership snapshot; excluding the sender is the caller's job
    pub fn occupants_of(&self, name: &str) -> Vec<ParticipantId> {
        self.rooms
            .get(name)
            .map(|room| room.occupants.clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn contains_room(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }
}
