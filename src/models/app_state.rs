use actix::Addr;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::coordinator::Coordinator;
use crate::websocket::ChessWebSocket;

/// Application state shared between connections
pub struct AppState {
    pub coordinator: Coordinator,
    pub sessions: Mutex<HashMap<String, Addr<ChessWebSocket>>>,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        AppState {
            coordinator,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}
