//! Per-room game coordination.
//!
//! The coordinator relays whole boards between the two peers of a room and
//! keeps the stored session in step. Peers validate their own moves; the
//! coordinator only re-checks them when `verify_moves` is on.

pub mod rooms;

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::error::CoordinatorError;
use crate::game::utils::game_status;
use crate::game::rules::{game_state, GameState};
use crate::game::{apply_move, infer_move, Move};
use crate::models::board::{Board, Color};
use crate::models::game_state::SessionPhase;
use crate::models::messages::{ClientMessage, ServerMessage};
use crate::store::{SessionStore, UserStore};

pub use rooms::{Room, RoomRegistry};

pub const MAX_PLAYERS: usize = 2;
pub const RATING_DELTA: i32 = 10;

/// A server event and the connections that should receive it
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipients: Vec<String>,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn to(conn: &str, message: ServerMessage) -> Self {
        Outbound {
            recipients: vec![conn.to_string()],
            message,
        }
    }
}

pub struct Coordinator {
    rooms: Mutex<RoomRegistry>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    verify_moves: bool,
}

impl Coordinator {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>) -> Self {
        Coordinator {
            rooms: Mutex::new(RoomRegistry::default()),
            sessions,
            users,
            verify_moves: false,
        }
    }

    /// Re-derive every relayed move on the server and drop the ones that do not check out
    pub fn with_move_verification(mut self, enabled: bool) -> Self {
        self.verify_moves = enabled;
        self
    }

    fn rooms(&self) -> MutexGuard<'_, RoomRegistry> {
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn room_of(&self, conn: &str) -> Option<String> {
        self.rooms().room_of(conn).map(str::to_string)
    }

    pub fn phase(&self, room_id: &str) -> SessionPhase {
        self.rooms().phase(room_id)
    }

    /// Dispatch one client event. Everything except `join` needs the
    /// connection to be in a room first; until then it has no handlers.
    pub fn handle(&self, conn: &str, msg: ClientMessage) -> Vec<Outbound> {
        let msg = match msg {
            ClientMessage::Join { room_id, board } => return self.join(conn, &room_id, board),
            other => other,
        };

        let room_id = match self.room_of(conn) {
            Some(room_id) => room_id,
            None => {
                warn!("Ignoring {} from {}: not in a room", msg.event_name(), conn);
                return Vec::new();
            }
        };
        debug!("{} in room {} sent {}", conn, room_id, msg.event_name());

        match msg {
            // handled above
            ClientMessage::Join { .. } => Vec::new(),
            ClientMessage::SaveMyColor { player_email, color } => {
                self.save_my_color(&room_id, &player_email, color);
                Vec::new()
            }
            ClientMessage::SendPieces { board, next_turn } => {
                self.send_pieces(conn, &room_id, board, next_turn)
            }
            ClientMessage::SaveChessboard {
                board,
                next_turn,
                player_email,
            } => {
                self.save_chessboard(&room_id, board, next_turn, player_email.as_deref());
                Vec::new()
            }
            ClientMessage::GameEndCheckmate { losing_color } => {
                self.game_end_checkmate(conn, &room_id, losing_color)
            }
            ClientMessage::GameEndStalemate => self.game_end_stalemate(conn, &room_id),
            ClientMessage::UserLeft => self.to_peers(conn, ServerMessage::OpponentLeft),
            ClientMessage::SendOpponentInfo { user } => {
                self.to_peers(conn, ServerMessage::ReceiveOpponentInfo { user })
            }
        }
    }

    fn to_peers(&self, conn: &str, message: ServerMessage) -> Vec<Outbound> {
        let recipients = self.rooms().peers(conn);
        if recipients.is_empty() {
            debug!("No peers of {} to receive {:?}", conn, message);
            return Vec::new();
        }
        vec![Outbound {
            recipients,
            message,
        }]
    }

    /// Subscribe `conn` to `room_id` unless two others are already there
    fn admit(&self, conn: &str, room_id: &str) -> Result<usize, CoordinatorError> {
        let mut rooms = self.rooms();
        if rooms.others_in(room_id, conn) >= MAX_PLAYERS {
            return Err(CoordinatorError::RoomCapacityExceeded(room_id.to_string()));
        }
        Ok(rooms.subscribe(conn, room_id))
    }

    pub fn join(&self, conn: &str, room_id: &str, board: Board) -> Vec<Outbound> {
        info!("Player {} joining room {}", conn, room_id);

        let occupancy = match self.admit(conn, room_id) {
            Ok(occupancy) => occupancy,
            Err(err) => {
                info!("Cannot join: {}", err);
                return vec![Outbound::to(
                    conn,
                    ServerMessage::RoomFull {
                        room_id: room_id.to_string(),
                        full: true,
                    },
                )];
            }
        };

        let stored = self.sessions.find_or_create(room_id, &board);

        let mut rooms = self.rooms();
        let room = match rooms.room_mut(room_id) {
            Some(room) => room,
            None => {
                warn!("Room {} vanished while {} was joining", room_id, conn);
                return vec![Outbound::to(conn, ServerMessage::error("Failed to join room"))];
            }
        };
        room.reopen();

        let (white_email, black_email) = match stored {
            Ok(session) => {
                if room.position.is_none() {
                    room.position = Some((session.board, session.turn));
                }
                (session.white_player_email, session.black_player_email)
            }
            Err(err) => {
                warn!("Loading room {} from the live board: {}", room_id, err);
                if room.position.is_none() {
                    room.position = Some((board, Color::White));
                }
                (None, None)
            }
        };
        let (current, turn) = match &room.position {
            Some((current, turn)) => (current.clone(), *turn),
            None => return Vec::new(),
        };
        drop(rooms);

        let assigned = if occupancy == 1 && white_email.is_none() {
            Some(Color::White)
        } else if occupancy == 2 && black_email.is_none() {
            Some(Color::Black)
        } else {
            None
        };

        let mut out = vec![Outbound::to(
            conn,
            ServerMessage::LoadChessboard {
                board: current,
                turn,
                black_email,
                white_email,
            },
        )];
        if let Some(color) = assigned {
            info!("Assigning {} to {} in room {}", color, conn, room_id);
            out.push(Outbound::to(conn, ServerMessage::PlayerColor { color }));
        }
        out
    }

    pub fn save_my_color(&self, room_id: &str, player_email: &str, color: Color) {
        if let Err(err) = self.persist_color_assignment(room_id, player_email, color) {
            warn!("save-my-color for room {}: {}", room_id, err);
        }
    }

    /// Record `player_email` as `color`; the first identity to claim a color keeps it
    pub fn persist_color_assignment(
        &self,
        room_id: &str,
        player_email: &str,
        color: Color,
    ) -> Result<(), CoordinatorError> {
        let mut session = self
            .sessions
            .find_by_id(room_id)?
            .ok_or_else(|| CoordinatorError::SessionNotFound(room_id.to_string()))?;
        if session.claim_color(color, player_email) {
            self.sessions.save(&session)?;
        }
        Ok(())
    }

    /// Find the one legal move from the room's last accepted position that
    /// reaches `board`, and the board the server derives from it. Only the
    /// placement of `board` is read; `hasMoved` flags come from the server.
    fn verify_relay(
        position: Option<&(Board, Color)>,
        board: &Board,
        next_turn: Color,
    ) -> Result<(Move, Board), CoordinatorError> {
        let (current, turn) = position.ok_or_else(|| {
            CoordinatorError::ValidationRejected("no position to compare against".to_string())
        })?;
        if next_turn != turn.opposite() {
            return Err(CoordinatorError::ValidationRejected(format!(
                "{} moved but passed the turn to {}",
                turn, next_turn
            )));
        }
        let mv = infer_move(current, board, *turn).ok_or_else(|| {
            let reason = format!("no legal {} move reaches that board", turn);
            CoordinatorError::ValidationRejected(reason)
        })?;
        Ok((mv, apply_move(current, &mv)))
    }

    pub fn send_pieces(
        &self,
        conn: &str,
        room_id: &str,
        board: Board,
        next_turn: Color,
    ) -> Vec<Outbound> {
        let mut rooms = self.rooms();
        let room = match rooms.room_mut(room_id) {
            Some(room) => room,
            None => return Vec::new(),
        };

        let board = if self.verify_moves {
            match Self::verify_relay(room.position.as_ref(), &board, next_turn) {
                Ok((mv, next)) => {
                    match game_state(&next, next_turn) {
                        GameState::Continue => debug!("Room {}: {:?} accepted", room_id, mv),
                        _ => info!(
                            "Room {}: {:?} ends the game, {}",
                            room_id,
                            mv,
                            game_status(&next, next_turn)
                        ),
                    }
                    next
                }
                Err(err) => {
                    warn!("Dropping board from {} in room {}: {}", conn, room_id, err);
                    return Vec::new();
                }
            }
        } else {
            board
        };
        room.position = Some((board.clone(), next_turn));

        let recipients = rooms.peers(conn);
        info!("Relaying board in room {} to {} peer(s)", room_id, recipients.len());
        if recipients.is_empty() {
            return Vec::new();
        }
        vec![Outbound {
            recipients,
            message: ServerMessage::ReceivePieces { board, next_turn },
        }]
    }

    pub fn save_chessboard(
        &self,
        room_id: &str,
        board: Board,
        next_turn: Color,
        player_email: Option<&str>,
    ) {
        // With verification on, only the last accepted position is stored
        let board = {
            let mut rooms = self.rooms();
            match rooms.room_mut(room_id) {
                Some(room) if self.verify_moves => match &room.position {
                    Some((current, turn))
                        if *turn == next_turn && current.placement() == board.placement() =>
                    {
                        current.clone()
                    }
                    _ => {
                        warn!("Not persisting unverified board for room {}", room_id);
                        return;
                    }
                },
                Some(room) => {
                    room.position = Some((board.clone(), next_turn));
                    board
                }
                None => board,
            }
        };

        if let Err(err) = self.persist_board(room_id, board, next_turn, player_email) {
            warn!("save-chessboard for room {}: {}", room_id, err);
        }
    }

    /// Overwrite the stored board and turn. Last write wins.
    pub fn persist_board(
        &self,
        room_id: &str,
        board: Board,
        next_turn: Color,
        player_email: Option<&str>,
    ) -> Result<(), CoordinatorError> {
        let mut session = self
            .sessions
            .find_by_id(room_id)?
            .ok_or_else(|| CoordinatorError::SessionNotFound(room_id.to_string()))?;
        session.record_board(board, next_turn, player_email);
        self.sessions.save(&session)?;
        Ok(())
    }

    fn close_room(&self, room_id: &str) {
        if let Some(room) = self.rooms().room_mut(room_id) {
            room.close();
        }
    }

    pub fn game_end_checkmate(
        &self,
        conn: &str,
        room_id: &str,
        losing_color: Color,
    ) -> Vec<Outbound> {
        match self.end_by_checkmate(room_id, losing_color) {
            Ok(true) => info!("Room {} ended by checkmate, ratings updated", room_id),
            Ok(false) => info!("Room {} ended by checkmate, ratings unchanged", room_id),
            Err(err) => warn!("game-end-checkmate for room {}: {}", room_id, err),
        }
        self.close_room(room_id);
        self.to_peers(conn, ServerMessage::ReceiveUpdateCheckmate { losing_color })
    }

    /// Settle ratings and delete the session. Returns whether ratings changed.
    /// A room that is already gone is left alone.
    pub fn end_by_checkmate(
        &self,
        room_id: &str,
        losing_color: Color,
    ) -> Result<bool, CoordinatorError> {
        let session = match self.sessions.find_by_id(room_id)? {
            Some(session) => session,
            None => {
                debug!("Room {} already closed", room_id);
                return Ok(false);
            }
        };

        let winner = losing_color.opposite();
        let rated = match (session.email_for(winner), session.email_for(losing_color)) {
            (Some(winner_email), Some(loser_email)) => {
                match self.settle_ratings(winner_email, loser_email) {
                    Ok(rated) => rated,
                    Err(err) => {
                        warn!("Could not update ratings for room {}: {}", room_id, err);
                        false
                    }
                }
            }
            _ => false,
        };

        self.sessions.delete_by_id(room_id)?;
        Ok(rated)
    }

    /// Move both ratings or neither. A failed loser save puts the winner back.
    fn settle_ratings(
        &self,
        winner_email: &str,
        loser_email: &str,
    ) -> Result<bool, CoordinatorError> {
        let (winner, loser) = match (
            self.users.find_by_email(winner_email)?,
            self.users.find_by_email(loser_email)?,
        ) {
            (Some(winner), Some(loser)) => (winner, loser),
            _ => return Ok(false),
        };

        let mut promoted = winner.clone();
        promoted.adjust_rating(RATING_DELTA);
        let mut demoted = loser;
        demoted.adjust_rating(-RATING_DELTA);

        if let Err(err) = self.users.save_user(&promoted) {
            warn!("Rating of {} not saved: {}", winner_email, err);
            return Err(err.into());
        }
        if let Err(err) = self.users.save_user(&demoted) {
            warn!("Rating of {} not saved, restoring {}: {}", loser_email, winner_email, err);
            if let Err(restore) = self.users.save_user(&winner) {
                warn!("Could not restore rating of {}: {}", winner_email, restore);
            }
            return Err(err.into());
        }
        Ok(true)
    }

    pub fn game_end_stalemate(&self, conn: &str, room_id: &str) -> Vec<Outbound> {
        if let Err(err) = self.end_by_stalemate(room_id) {
            warn!("game-end-stalemate for room {}: {}", room_id, err);
        }
        self.close_room(room_id);
        self.to_peers(conn, ServerMessage::ReceiveUpdateStalemate)
    }

    pub fn end_by_stalemate(&self, room_id: &str) -> Result<(), CoordinatorError> {
        if !self.sessions.delete_by_id(room_id)? {
            debug!("Room {} already closed", room_id);
        }
        Ok(())
    }

    /// Explicit delete request from the HTTP surface
    pub fn delete_board(&self, room_id: &str) -> Result<(), CoordinatorError> {
        let deleted = self.sessions.delete_by_id(room_id)?;
        self.close_room(room_id);
        if !deleted {
            return Err(CoordinatorError::SessionNotFound(room_id.to_string()));
        }
        info!("Deleted board for room {}", room_id);
        Ok(())
    }

    /// Forget `conn`. The stored session stays so the player can come back.
    pub fn disconnect(&self, conn: &str) {
        if let Some(room_id) = self.rooms().unsubscribe(conn) {
            info!("Removed {} from room {}", conn, room_id);
        }
    }
}
