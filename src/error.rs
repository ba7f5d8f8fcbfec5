//! Error types for the registry.

use thiserror::Error;

/// Main error type for registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A required join input was absent; nothing was registered.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
