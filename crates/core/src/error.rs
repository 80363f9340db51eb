//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant carries a distinguishing kind plus a human-readable message;
/// callers map these to their transport (e.g. HTTP status codes) at the edge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or malformed. No mutation occurred.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique key is already taken, or a business conflict occurred
    /// (already-active subscription, plan with active subscribers, stale
    /// revision).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A sale or decrease asked for more units than are in stock.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// A status value outside the enumerated set, or an illegal target for
    /// the current status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Transient storage failure. Retry policy is the caller's decision.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
