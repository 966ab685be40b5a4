//! Error types for loading.
//!
//! Per-item failures are ordinary data: they travel inside
//! [`FetchOutcome::Failed`](crate::models::FetchOutcome) and error
//! notifications, and are never raised past the aggregator.

use crate::models::Identifier;
use thiserror::Error;

/// Why a single resource failed to load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("payload is not a recognised image")]
    NotAnImage,
}

/// A resource that could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load {identifier}: {reason}")]
pub struct LoadFailure {
    pub identifier: Identifier,
    pub reason: FailureReason,
}

impl LoadFailure {
    pub fn new(identifier: impl Into<Identifier>, reason: FailureReason) -> Self {
        Self {
            identifier: identifier.into(),
            reason,
        }
    }
}

/// Errors raised when setting up a load run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("no identifiers to load")]
    NoIdentifiers,
}
