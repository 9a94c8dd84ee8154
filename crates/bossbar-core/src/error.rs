//! Domain-specific error types following panic-free policy.

use crate::EntityId;
use thiserror::Error;

/// Errors that can occur in bar operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The anchor can no longer be attached to a bar.
    #[error("Anchor {id} can not be used: {reason}")]
    InvalidAnchor { id: EntityId, reason: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
