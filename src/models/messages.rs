use actix::Message;
use serde::{Deserialize, Serialize};

use crate::models::board::{Board, Color};
use crate::models::user::UserProfile;

/// Event sent from client to server.
///
/// Frames are JSON objects tagged by `event`, e.g.
/// `{"event":"send-pieces","board":[...],"nextTurn":"black"}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join { room_id: String, board: Board },
    #[serde(rename_all = "camelCase")]
    SaveMyColor { player_email: String, color: Color },
    #[serde(rename_all = "camelCase")]
    SendPieces { board: Board, next_turn: Color },
    #[serde(rename_all = "camelCase")]
    SaveChessboard {
        board: Board,
        next_turn: Color,
        #[serde(default)]
        player_email: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GameEndCheckmate { losing_color: Color },
    GameEndStalemate,
    UserLeft,
    SendOpponentInfo { user: UserProfile },
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::SaveMyColor { .. } => "save-my-color",
            ClientMessage::SendPieces { .. } => "send-pieces",
            ClientMessage::SaveChessboard { .. } => "save-chessboard",
            ClientMessage::GameEndCheckmate { .. } => "game-end-checkmate",
            ClientMessage::GameEndStalemate => "game-end-stalemate",
            ClientMessage::UserLeft => "user-left",
            ClientMessage::SendOpponentInfo { .. } => "send-opponent-info",
        }
    }
}

/// Event sent from server to client.
///
/// `recieve-pieces` and `recieve-opponent-info` are spelled the way
/// deployed clients expect them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    LoadChessboard {
        board: Board,
        turn: Color,
        black_email: Option<String>,
        white_email: Option<String>,
    },
    PlayerColor { color: Color },
    #[serde(rename_all = "camelCase")]
    RoomFull { room_id: String, full: bool },
    #[serde(rename = "recieve-pieces", rename_all = "camelCase")]
    ReceivePieces { board: Board, next_turn: Color },
    #[serde(rename_all = "camelCase")]
    ReceiveUpdateCheckmate { losing_color: Color },
    ReceiveUpdateStalemate,
    OpponentLeft,
    #[serde(rename = "recieve-opponent-info")]
    ReceiveOpponentInfo { user: UserProfile },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
