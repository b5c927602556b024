use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::models::board::Board;
use crate::models::game_state::GameSession;
use crate::models::user::UserProfile;
use crate::store::{SessionStore, StoreError, UserStore};

/// In-process store used by the server binary and the tests
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, GameSession>>,
    users: Mutex<HashMap<String, UserProfile>>,
    offline: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until switched back on
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn insert_user(&self, user: UserProfile) {
        lock(&self.users).insert(user.player_email_id.clone(), user);
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn find_or_create(&self, room_id: &str, initial: &Board) -> Result<GameSession, StoreError> {
        self.check()?;
        let mut sessions = lock(&self.sessions);
        let session = sessions.entry(room_id.to_string()).or_insert_with(|| {
            debug!("Creating session for room {}", room_id);
            GameSession::new(room_id, initial.clone())
        });
        Ok(session.clone())
    }

    fn find_by_id(&self, room_id: &str) -> Result<Option<GameSession>, StoreError> {
        self.check()?;
        Ok(lock(&self.sessions).get(room_id).cloned())
    }

    fn save(&self, session: &GameSession) -> Result<(), StoreError> {
        self.check()?;
        lock(&self.sessions).insert(session.room_id.clone(), session.clone());
        Ok(())
    }

    fn delete_by_id(&self, room_id: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(lock(&self.sessions).remove(room_id).is_some())
    }
}

impl UserStore for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        self.check()?;
        Ok(lock(&self.users).get(email).cloned())
    }

    fn save_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.check()?;
        self.insert_user(user.clone());
        Ok(())
    }
}
