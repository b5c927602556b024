pub mod app_state;
pub mod board;
pub mod game_state;
pub mod messages;
pub mod user;

// Re-export important types
pub use app_state::*;
pub use board::{Board, BoardError, Color, Piece, PieceKind};
pub use game_state::*;
pub use messages::*;
pub use user::UserProfile;
