use std::collections::HashMap;

use crate::models::board::{Board, Color};
use crate::models::game_state::SessionPhase;

/// Live state of one room: who is subscribed and the last accepted position
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<String>,
    pub position: Option<(Board, Color)>,
    terminal: bool,
}

impl Room {
    pub fn phase(&self) -> SessionPhase {
        if self.terminal {
            return SessionPhase::Terminal;
        }
        match self.members.len() {
            0 => SessionPhase::Empty,
            1 => SessionPhase::WaitingForSecond,
            _ => SessionPhase::Active,
        }
    }

    pub fn close(&mut self) {
        self.terminal = true;
        self.position = None;
    }

    pub fn reopen(&mut self) {
        self.terminal = false;
    }
}

/// Subscription table: which connection listens to which room.
///
/// A connection belongs to at most one room. Unsubscribing is the only way
/// out, and it always removes both directions of the mapping.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    memberships: HashMap<String, String>,
}

impl RoomRegistry {
    pub fn room_of(&self, conn: &str) -> Option<&str> {
        self.memberships.get(conn).map(String::as_str)
    }

    /// Occupants of `room_id` other than `conn`
    pub fn others_in(&self, room_id: &str, conn: &str) -> usize {
        self.rooms
            .get(room_id)
            .map_or(0, |room| room.members.iter().filter(|m| *m != conn).count())
    }

    /// Put `conn` in `room_id`, leaving any previous room. Returns the new occupancy.
    pub fn subscribe(&mut self, conn: &str, room_id: &str) -> usize {
        self.unsubscribe(conn);
        let room = self.rooms.entry(room_id.to_string()).or_default();
        room.members.push(conn.to_string());
        self.memberships.insert(conn.to_string(), room_id.to_string());
        room.members.len()
    }

    /// Drop `conn` from its room, forgetting rooms nobody listens to any more.
    /// Returns the room it left.
    pub fn unsubscribe(&mut self, conn: &str) -> Option<String> {
        let room_id = self.memberships.remove(conn)?;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.members.retain(|m| m != conn);
            if room.members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
        Some(room_id)
    }

    /// Everyone in `conn`'s room except `conn`
    pub fn peers(&self, conn: &str) -> Vec<String> {
        self.room_of(conn)
            .and_then(|room_id| self.rooms.get(room_id))
            .map(|room| room.members.iter().filter(|m| *m != conn).cloned().collect())
            .unwrap_or_default()
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn phase(&self, room_id: &str) -> SessionPhase {
        self.rooms.get(room_id).map_or(SessionPhase::Empty, Room::phase)
    }
}
