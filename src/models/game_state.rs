use std::time::SystemTime;

use crate::models::board::{Board, Color};

/// Stored record for one room
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub room_id: String,
    pub board: Board,
    pub turn: Color,
    pub white_player_email: Option<String>,
    pub black_player_email: Option<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl GameSession {
    /// Fresh session, white to move, no identities recorded yet
    pub fn new(room_id: &str, board: Board) -> Self {
        let now = SystemTime::now();
        GameSession {
            room_id: room_id.to_string(),
            board,
            turn: Color::White,
            white_player_email: None,
            black_player_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn email_for(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_player_email.as_deref(),
            Color::Black => self.black_player_email.as_deref(),
        }
    }

    /// Record `email` for `color` unless the slot is already taken.
    /// Returns whether anything changed.
    pub fn claim_color(&mut self, color: Color, email: &str) -> bool {
        let slot = match color {
            Color::White => &mut self.white_player_email,
            Color::Black => &mut self.black_player_email,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(email.to_string());
        true
    }

    /// Store a new position. The mover just handed the turn to `next_turn`,
    /// so if the mover's slot is still empty it is assumed to be theirs.
    pub fn record_board(&mut self, board: Board, next_turn: Color, mover_email: Option<&str>) {
        self.board = board;
        self.turn = next_turn;
        if let Some(email) = mover_email {
            self.claim_color(next_turn.opposite(), email);
        }
        self.updated_at = SystemTime::now();
    }
}

/// Lifecycle of a room as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    WaitingForSecond,
    Active,
    Terminal,
}
