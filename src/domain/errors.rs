//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Missing user ID")]
    MissingUserId,

    /// Identifier is not a well-formed record id for the store.
    #[error("Invalid record id: {0:?}")]
    InvalidId(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("File relocation failed: {0}")]
    Files(String),
}
