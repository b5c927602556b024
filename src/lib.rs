//! Two-player online chess rooms.
//!
//! `game` holds the rules engine, `coordinator` the per-room relay and
//! persistence logic, and `websocket`/`routes` the actix surface.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod store;
pub mod websocket;

pub use config::Config;
pub use coordinator::{Coordinator, Outbound};
pub use error::{ConfigError, CoordinatorError};
