use thiserror::Error;

/// Errors surfaced by the portal: configuration, storage, notification
/// delivery and request handling.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("notifier error: {0}")]
    NotifierError(String),
}

pub type PortalResult<T> = Result<T, PortalError>;
