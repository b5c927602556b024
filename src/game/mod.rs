pub mod commit;
pub mod rules;
pub mod utils;

pub use commit::{apply_move, infer_move, play, Move, RulesError};
pub use rules::GameState;
