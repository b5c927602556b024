//! Move legality, check detection and end-of-game detection.
//!
//! Every function here is pure: it reads a `Board` and returns a value.
//! Speculative positions are built with [`simulate_move`], never by
//! mutating the caller's board.

use crate::models::board::{in_bounds, Board, Color, Piece, PieceKind};

/// Outcome of looking at a position from the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Continue,
    Checkmate,
    Stalemate,
}

pub fn piece_at(board: &Board, x: i8, y: i8) -> Option<&Piece> {
    board.piece_at(x, y)
}

/// True when every square strictly between the endpoints is empty.
///
/// The endpoints must share a rank, file or diagonal. Off-board endpoints
/// are never clear.
pub fn is_path_clear(board: &Board, from_x: i8, from_y: i8, to_x: i8, to_y: i8) -> bool {
    if !in_bounds(from_x, from_y) || !in_bounds(to_x, to_y) {
        return false;
    }
    let dx = (to_x - from_x).signum();
    let dy = (to_y - from_y).signum();
    let (mut x, mut y) = (from_x + dx, from_y + dy);

    while (x, y) != (to_x, to_y) {
        if !in_bounds(x, y) {
            return false;
        }
        if board.piece_at(x, y).is_some() {
            return false;
        }
        x += dx;
        y += dy;
    }
    true
}

/// Shape-only movement shared by attacks and moves for every piece but the pawn
fn slides_or_steps(piece: &Piece, to_x: i8, to_y: i8, board: &Board) -> bool {
    let dx = to_x - piece.x;
    let dy = to_y - piece.y;
    let (adx, ady) = (dx.abs(), dy.abs());

    match piece.kind {
        PieceKind::Rook => {
            (dx == 0 || dy == 0) && is_path_clear(board, piece.x, piece.y, to_x, to_y)
        }
        PieceKind::Bishop => adx == ady && is_path_clear(board, piece.x, piece.y, to_x, to_y),
        PieceKind::Queen => {
            (dx == 0 || dy == 0 || adx == ady)
                && is_path_clear(board, piece.x, piece.y, to_x, to_y)
        }
        PieceKind::Knight => (adx == 2 && ady == 1) || (adx == 1 && ady == 2),
        PieceKind::King => adx <= 1 && ady <= 1,
        PieceKind::Pawn => false,
    }
}

/// Whether `piece` attacks (to_x, to_y), regardless of turn or check.
///
/// Pawns attack diagonally forward only.
pub fn can_attack(piece: &Piece, to_x: i8, to_y: i8, board: &Board) -> bool {
    if !in_bounds(piece.x, piece.y) || !in_bounds(to_x, to_y) || piece.is_at(to_x, to_y) {
        return false;
    }
    match piece.kind {
        PieceKind::Pawn => {
            (to_y - piece.y).abs() == 1 && to_x - piece.x == piece.color.pawn_direction()
        }
        _ => slides_or_steps(piece, to_x, to_y, board),
    }
}

/// Full movement legality for `piece` ignoring check-safety
pub fn is_geometry_valid(piece: &Piece, to_x: i8, to_y: i8, board: &Board) -> bool {
    if !in_bounds(piece.x, piece.y) || !in_bounds(to_x, to_y) || piece.is_at(to_x, to_y) {
        return false;
    }
    let target = board.piece_at(to_x, to_y);
    if target.map_or(false, |t| t.color == piece.color) {
        return false;
    }

    match piece.kind {
        PieceKind::Pawn => {
            let dir = piece.color.pawn_direction();
            let dx = to_x - piece.x;
            let dy = to_y - piece.y;

            if dy == 0 && dx == dir {
                target.is_none()
            } else if dy == 0 && dx == 2 * dir && piece.x == piece.color.pawn_start_rank() {
                target.is_none() && board.piece_at(piece.x + dir, piece.y).is_none()
            } else if dy.abs() == 1 && dx == dir {
                target.is_some()
            } else {
                false
            }
        }
        _ => slides_or_steps(piece, to_x, to_y, board),
    }
}

/// True when a piece of the opponent of `color` attacks (x, y)
pub fn is_square_attacked(board: &Board, x: i8, y: i8, color: Color) -> bool {
    let opponent = color.opposite();
    board
        .iter()
        .any(|p| p.color == opponent && can_attack(p, x, y, board))
}

/// Whether `color`'s king is attacked. A board with no such king is never in check.
pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    match board.king(color) {
        Some(king) => is_square_attacked(board, king.x, king.y, color),
        None => false,
    }
}

/// Board after `piece` lands on (to_x, to_y), capturing any occupant.
///
/// Only used for speculative safety tests: no castling rook, no promotion.
pub fn simulate_move(board: &Board, piece: &Piece, to_x: i8, to_y: i8) -> Board {
    let moved = Piece {
        x: to_x,
        y: to_y,
        has_moved: true,
        ..piece.clone()
    };
    board.without(piece.x, piece.y).with(moved)
}

pub fn is_valid_move(
    board: &Board,
    from_x: i8,
    from_y: i8,
    to_x: i8,
    to_y: i8,
    turn: Color,
) -> bool {
    let piece = match board.piece_at(from_x, from_y) {
        Some(piece) => piece,
        None => return false,
    };
    if piece.color != turn {
        return false;
    }
    if !in_bounds(from_x, from_y) || !in_bounds(to_x, to_y) || (from_x, from_y) == (to_x, to_y) {
        return false;
    }

    if piece.kind == PieceKind::King && from_x == to_x && (to_y - from_y).abs() == 2 {
        return is_castling_valid(board, piece, to_x, to_y);
    }

    if !is_geometry_valid(piece, to_x, to_y, board) {
        return false;
    }
    !is_king_in_check(&simulate_move(board, piece, to_x, to_y), piece.color)
}

/// Castling preconditions for `king` landing on (to_x, to_y).
///
/// Does not relocate the rook; see `game::commit::apply_move`.
pub fn is_castling_valid(board: &Board, king: &Piece, to_x: i8, to_y: i8) -> bool {
    if king.kind != PieceKind::King || king.has_moved {
        return false;
    }
    if !in_bounds(king.x, king.y) || !in_bounds(to_x, to_y) {
        return false;
    }
    if to_x != king.x || (to_y - king.y).abs() != 2 {
        return false;
    }
    if is_king_in_check(board, king.color) {
        return false;
    }

    let kingside = to_y > king.y;
    let rook_y = if kingside { 7 } else { 0 };
    match board.piece_at(king.x, rook_y) {
        Some(rook)
            if rook.kind == PieceKind::Rook && rook.color == king.color && !rook.has_moved => {}
        _ => return false,
    }

    let (low, high) = (king.y.min(rook_y), king.y.max(rook_y));
    if ((low + 1)..high).any(|y| board.piece_at(king.x, y).is_some()) {
        return false;
    }

    let step = if kingside { 1 } else { -1 };
    !is_square_attacked(board, king.x, king.y + step, king.color)
        && !is_square_attacked(board, to_x, to_y, king.color)
}

/// Every square the piece on (x, y) may legally move to when `turn` is to move
pub fn legal_destinations(board: &Board, x: i8, y: i8, turn: Color) -> Vec<(i8, i8)> {
    let mut squares = Vec::new();
    for to_x in 0..8 {
        for to_y in 0..8 {
            if is_valid_move(board, x, y, to_x, to_y, turn) {
                squares.push((to_x, to_y));
            }
        }
    }
    squares
}

pub fn has_any_valid_move(board: &Board, color: Color) -> bool {
    board.iter().filter(|p| p.color == color).any(|p| {
        (0..8).any(|to_x| (0..8).any(|to_y| is_valid_move(board, p.x, p.y, to_x, to_y, color)))
    })
}

pub fn game_state(board: &Board, to_move: Color) -> GameState {
    if has_any_valid_move(board, to_move) {
        GameState::Continue
    } else if is_king_in_check(board, to_move) {
        GameState::Checkmate
    } else {
        GameState::Stalemate
    }
}
