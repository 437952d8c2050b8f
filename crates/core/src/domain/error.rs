// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Queue already exists: {0}")]
    DuplicateQueue(String),

    #[error("Unknown queue: {0}")]
    UnknownQueue(String),

    #[error("Cannot allocate job storage: {0}")]
    Allocation(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
