//! Error types
//!
//! Defines domain-specific error types for each layer of the account store.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence and hashing failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Account store at {} is unreadable: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Credential hashing error: {0}")]
    Hashing(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<argon2::Error> for StoreError {
    fn from(err: argon2::Error) -> Self {
        StoreError::Hashing(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for StoreError {
    fn from(err: argon2::password_hash::Error) -> Self {
        StoreError::Hashing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Account and authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account is protected: {0}")]
    IsProtected(String),

    #[error("Wrong credential for account: {0}")]
    WrongCredential(String),

    /// Deliberately carries no username: absent accounts and bad credentials look the same
    #[error("Invalid username or credential")]
    Unauthenticated,

    #[error("Administrator privileges required")]
    PermissionDenied,

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Boundary form validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Credentials do not match")]
    ConfirmationMismatch,

    #[error("Credential must be at least {min} characters")]
    CredentialTooShort { min: usize },

    #[error("Username must be at most {max} characters")]
    UsernameTooLong { max: usize },

    #[error("{0} contains invalid characters")]
    InvalidCharacters(&'static str),
}

/// General error that encompasses all error types
#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
