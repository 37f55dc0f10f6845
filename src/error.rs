//! Error types for the credential gate

use std::io;

use thiserror::Error;

use crate::auth::{KeyLoadError, StoreError};

/// Result type alias for the credential gate
pub type Result<T> = std::result::Result<T, Error>;

/// Startup and server errors
///
/// Per-request failures (validation, authorization, login) have their own
/// types in [`crate::auth`] and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key pair could not be loaded
    #[error("Key load error: {0}")]
    KeyLoad(#[from] KeyLoadError),

    /// Revocation store could not be reached at startup
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
