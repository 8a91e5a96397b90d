//! Runtime error types for the STEWARD engine.
//!
//! All fallible operations across the STEWARD crates return `StewardResult<T>`.
//! Error variants carry enough context to produce actionable audit entries.

use thiserror::Error;

use crate::action::{ActionId, ActionStatus};

/// The unified error type for the STEWARD engine.
#[derive(Debug, Error)]
pub enum StewardError {
    /// The request failed validation before any state was created.
    ///
    /// Covers unknown action types, missing required parameters, schema
    /// violations, and handler-rejected parameters. Never retried.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The in-memory action queue is full. Rejected at creation time.
    #[error("action queue at capacity ({capacity})")]
    CapacityExceeded { capacity: usize },

    /// No action with the given id exists. Caller error, non-retryable.
    #[error("action '{action_id}' not found")]
    NotFound { action_id: ActionId },

    /// The requested operation is not valid for the action's current status.
    ///
    /// For example approving a non-pending action, or rolling back an action
    /// that has not completed. Caller error, non-retryable.
    #[error("cannot {operation} action '{action_id}' in status '{status}'")]
    IllegalTransition {
        operation: String,
        action_id: ActionId,
        status: ActionStatus,
    },

    /// No handler is registered for the action's type.
    ///
    /// Surfaced as a terminal `Failed` status on the action — a missing
    /// handler will not appear by retrying.
    #[error("no handler registered for action type '{action_type}'")]
    HandlerMissing { action_type: String },

    /// The handler's side effect failed.
    ///
    /// Retryable up to the action's retry ceiling, after which the action
    /// becomes terminally `Failed` with this reason preserved for audit.
    #[error("handler execution failed: {reason}")]
    HandlerExecution { reason: String },

    /// A rollback attempt failed.
    ///
    /// Recorded in the audit log; the action keeps its terminal `Completed`
    /// status since the side effect may be partially undone.
    #[error("rollback failed: {reason}")]
    RollbackFailed { reason: String },

    /// The audit sink could not persist an entry.
    ///
    /// Treated as fatal for the triggering operation — an action whose
    /// history cannot be recorded must not proceed silently.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the STEWARD crates.
pub type StewardResult<T> = Result<T, StewardError>;
