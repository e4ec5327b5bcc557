//! Custom error types for the registry service

use common::SnapshotError;
use thiserror::Error;

/// Custom error type for registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A user with this username is already registered
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// No user with this username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Unknown username or wrong secret; the two are not distinguished
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// An update tried to change the registry key of a user
    #[error("Username cannot change from '{expected}' to '{found}'")]
    UsernameImmutable { expected: String, found: String },

    /// Index outside a user's workout, meal or goal list
    #[error("No {kind} at position {index}")]
    RecordNotFound { kind: &'static str, index: usize },

    /// Snapshot error
    #[error("Persistence error: {0}")]
    Persistence(#[from] SnapshotError),
}

/// Type alias for registry results
pub type RegistryResult<T> = Result<T, RegistryError>;
