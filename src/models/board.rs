use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Side of the board
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Direction a pawn of this color travels along x
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Rank a pawn of this color starts on
    pub fn pawn_start_rank(self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Rank on which a pawn of this color promotes
    pub fn promotion_rank(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// Image path the browser client uses for a piece
pub fn asset_path(color: Color, kind: PieceKind) -> String {
    let side = match color {
        Color::White => 'w',
        Color::Black => 'b',
    };
    format!("/images/{}{}.png", side, kind.letter())
}

/// A single piece on the board.
///
/// `x` is the rank index (0 is black's back rank) and `y` the file index
/// (0 is the a-file).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
    pub x: i8,
    pub y: i8,
    #[serde(default)]
    pub has_moved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color, x: i8, y: i8) -> Self {
        Piece {
            kind,
            color,
            x,
            y,
            has_moved: false,
            image: Some(asset_path(color, kind)),
        }
    }

    pub fn moved(mut self) -> Self {
        self.has_moved = true;
        self
    }

    pub fn is_at(&self, x: i8, y: i8) -> bool {
        self.x == x && self.y == y
    }
}

/// Unordered set of pieces, at most one per square.
///
/// Boards are values: every operation that changes the position returns a
/// new `Board` and leaves the receiver untouched. Decoding rejects pieces
/// off the board and squares holding two pieces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(try_from = "Vec<Piece>", into = "Vec<Piece>")]
pub struct Board {
    pieces: Vec<Piece>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("{kind:?} at ({x}, {y}) is off the board")]
    OffBoard { kind: PieceKind, x: i8, y: i8 },
    #[error("square ({x}, {y}) holds more than one piece")]
    SquareTaken { x: i8, y: i8 },
}

impl TryFrom<Vec<Piece>> for Board {
    type Error = BoardError;

    fn try_from(pieces: Vec<Piece>) -> Result<Self, Self::Error> {
        let mut taken = HashSet::new();
        for piece in &pieces {
            let (x, y) = (piece.x, piece.y);
            if !in_bounds(x, y) {
                return Err(BoardError::OffBoard {
                    kind: piece.kind,
                    x,
                    y,
                });
            }
            if !taken.insert((x, y)) {
                return Err(BoardError::SquareTaken { x, y });
            }
        }
        Ok(Board { pieces })
    }
}

impl From<Board> for Vec<Piece> {
    fn from(board: Board) -> Self {
        board.pieces
    }
}

impl Board {
    pub fn new(pieces: Vec<Piece>) -> Self {
        Board { pieces }
    }

    /// Standard starting position
    pub fn initial() -> Self {
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut pieces = Vec::with_capacity(32);
        for (file, kind) in back_rank.iter().enumerate() {
            let y = file as i8;
            pieces.push(Piece::new(*kind, Color::Black, 0, y));
            pieces.push(Piece::new(PieceKind::Pawn, Color::Black, 1, y));
            pieces.push(Piece::new(PieceKind::Pawn, Color::White, 6, y));
            pieces.push(Piece::new(*kind, Color::White, 7, y));
        }
        Board { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece_at(&self, x: i8, y: i8) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.is_at(x, y))
    }

    pub fn king(&self, color: Color) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|p| p.kind == PieceKind::King && p.color == color)
    }

    /// New board without whatever stands on (x, y)
    pub fn without(&self, x: i8, y: i8) -> Board {
        Board {
            pieces: self.pieces.iter().filter(|p| !p.is_at(x, y)).cloned().collect(),
        }
    }

    /// New board with `piece` added, replacing anything on its square
    pub fn with(&self, piece: Piece) -> Board {
        let mut next = self.without(piece.x, piece.y);
        next.pieces.push(piece);
        next
    }

    /// Position fingerprint: kind, color and square of every piece, sorted.
    /// Ignores `hasMoved` and images.
    pub fn placement(&self) -> Vec<(i8, i8, PieceKind, Color)> {
        let mut squares: Vec<_> = self
            .pieces
            .iter()
            .map(|p| (p.x, p.y, p.kind, p.color))
            .collect();
        squares.sort_by_key(|&(x, y, kind, color)| (x, y, kind, color == Color::Black));
        squares
    }
}

pub fn in_bounds(x: i8, y: i8) -> bool {
    (0..8).contains(&x) && (0..8).contains(&y)
}
