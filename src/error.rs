use thiserror::Error;

use crate::store::StoreError;

/// Failures of a coordinator operation.
///
/// None of these reach the peers as a rejection: they are logged at the
/// operation boundary and the operation degrades to a no-op or a plain relay.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("room {0} already has two players")]
    RoomCapacityExceeded(String),
    #[error("no session stored for room {0}")]
    SessionNotFound(String),
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] StoreError),
    #[error("move rejected: {0}")]
    ValidationRejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
