// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Request error: {0}")]
    Request(#[from] crate::application::protocol::RequestError),

    #[error("Spawn error: {0}")]
    Spawn(#[from] crate::port::SpawnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Listener setup failed: {0}")]
    ListenSetup(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
