use crate::game::rules::{game_state, is_king_in_check, GameState};
use crate::models::board::{Board, Color};

/// Get the game status of a position as a string
pub fn game_status(board: &Board, to_move: Color) -> String {
    match game_state(board, to_move) {
        GameState::Checkmate => format!("{}_wins", to_move.opposite()),
        GameState::Stalemate => "stalemate".to_string(),
        GameState::Continue if is_king_in_check(board, to_move) => "check".to_string(),
        GameState::Continue => format!("{}_turn", to_move),
    }
}
