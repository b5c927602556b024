//! Collaborator interfaces for persistence.
//!
//! Both stores are key-value-by-id and may be eventually consistent. Calls
//! are short request/response exchanges; retries belong to the transport,
//! not to callers.

pub mod memory;

use thiserror::Error;

use crate::models::board::Board;
use crate::models::game_state::GameSession;
use crate::models::user::UserProfile;

pub use memory::MemoryStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait SessionStore: Send + Sync {
    /// Load the session for `room_id`, creating it from `initial` if absent
    fn find_or_create(&self, room_id: &str, initial: &Board) -> Result<GameSession, StoreError>;

    fn find_by_id(&self, room_id: &str) -> Result<Option<GameSession>, StoreError>;

    /// Overwrite the stored session. Last write wins.
    fn save(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Remove the session. Returns whether one existed; deleting a missing
    /// session is not an error.
    fn delete_by_id(&self, room_id: &str) -> Result<bool, StoreError>;
}

pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;

    fn save_user(&self, user: &UserProfile) -> Result<(), StoreError>;
}
