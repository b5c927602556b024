use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::rules::{is_valid_move, legal_destinations};
use crate::models::board::{asset_path, Board, Color, Piece, PieceKind};

/// A move request. Never persisted; the wire carries whole boards instead.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub from_x: i8,
    pub from_y: i8,
    pub to_x: i8,
    pub to_y: i8,
    #[serde(default)]
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from_x: i8, from_y: i8, to_x: i8, to_y: i8) -> Self {
        Move {
            from_x,
            from_y,
            to_x,
            to_y,
            promotion: None,
        }
    }

    pub fn promoting(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("illegal move {from:?} -> {to:?} for {turn}")]
    IllegalMove {
        from: (i8, i8),
        to: (i8, i8),
        turn: Color,
    },
}

/// Commit `mv` on `board` without validating it.
///
/// Handles the side effects the rules leave to the caller: the castling
/// rook jumps to file 3 or 5, a pawn on the last rank is promoted (queen
/// unless `mv.promotion` says otherwise), and moved pieces are flagged.
pub fn apply_move(board: &Board, mv: &Move) -> Board {
    let piece = match board.piece_at(mv.from_x, mv.from_y) {
        Some(piece) => piece.clone(),
        None => return board.clone(),
    };

    let mut next = board.without(mv.from_x, mv.from_y);

    let file_shift = (i16::from(mv.to_y) - i16::from(mv.from_y)).abs();
    if piece.kind == PieceKind::King && mv.from_x == mv.to_x && file_shift == 2 {
        let (rook_from, rook_to) = if mv.to_y > mv.from_y { (7, 5) } else { (0, 3) };
        if let Some(rook) = board.piece_at(mv.from_x, rook_from) {
            let rook = Piece {
                y: rook_to,
                ..rook.clone()
            }
            .moved();
            next = next.without(mv.from_x, rook_from).with(rook);
        }
    }

    let mut moved = Piece {
        x: mv.to_x,
        y: mv.to_y,
        ..piece
    }
    .moved();

    if moved.kind == PieceKind::Pawn && moved.x == moved.color.promotion_rank() {
        let kind = match mv.promotion {
            Some(PieceKind::Pawn) | Some(PieceKind::King) | None => PieceKind::Queen,
            Some(kind) => kind,
        };
        moved.kind = kind;
        moved.image = Some(asset_path(moved.color, kind));
    }

    next.with(moved)
}

/// Validate `mv` for `turn` and commit it
pub fn play(board: &Board, mv: &Move, turn: Color) -> Result<Board, RulesError> {
    if !is_valid_move(board, mv.from_x, mv.from_y, mv.to_x, mv.to_y, turn) {
        return Err(RulesError::IllegalMove {
            from: (mv.from_x, mv.from_y),
            to: (mv.to_x, mv.to_y),
            turn,
        });
    }
    Ok(apply_move(board, mv))
}

/// Find the legal move of `turn` that turns `before` into `after`.
///
/// Boards are compared by placement only, so images and `hasMoved` flags
/// in `after` are not trusted.
pub fn infer_move(before: &Board, after: &Board, turn: Color) -> Option<Move> {
    let target = after.placement();

    for piece in before.iter().filter(|p| p.color == turn) {
        for (to_x, to_y) in legal_destinations(before, piece.x, piece.y, turn) {
            let base = Move::new(piece.x, piece.y, to_x, to_y);
            let promotes = piece.kind == PieceKind::Pawn && to_x == turn.promotion_rank();

            let candidates: Vec<Move> = if promotes {
                PieceKind::PROMOTIONS.iter().map(|k| base.promoting(*k)).collect()
            } else {
                vec![base]
            };

            if let Some(mv) = candidates
                .into_iter()
                .find(|mv| apply_move(before, mv).placement() == target)
            {
                return Some(mv);
            }
        }
    }
    None
}
