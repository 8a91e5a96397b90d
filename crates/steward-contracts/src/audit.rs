//! Audit entry and query types.
//!
//! Every lifecycle event produces exactly one `AuditEntry`. The audit log is
//! append-only and independent of the live queue — evicting a completed
//! action does not touch its history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionId;

/// The lifecycle events the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    Created,
    Approved,
    AutoApproved,
    Rejected,
    ExecutionStarted,
    Completed,
    RetryScheduled,
    Failed,
    Cancelled,
    RolledBack,
    RollbackFailed,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Approved => "approved",
            Self::AutoApproved => "auto_approved",
            Self::Rejected => "rejected",
            Self::ExecutionStarted => "execution_started",
            Self::Completed => "completed",
            Self::RetryScheduled => "retry_scheduled",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::RolledBack => "rolled_back",
            Self::RollbackFailed => "rollback_failed",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action_id: ActionId,
    pub event: AuditEventKind,
    /// Who triggered the event, when a human was involved.
    pub actor: Option<String>,
    /// Structured event detail (decision reason, error string, retry delay…).
    pub detail: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action_id: ActionId, event: AuditEventKind) -> Self {
        Self {
            action_id,
            event,
            actor: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Filter for audit-log retrieval. All fields are optional and combined
/// with AND; `limit` keeps the most recent matches.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action_id: Option<ActionId>,
    pub event: Option<AuditEventKind>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_action(action_id: ActionId) -> Self {
        Self {
            action_id: Some(action_id),
            ..Self::default()
        }
    }

    pub fn with_event(mut self, event: AuditEventKind) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
