//! Action identity, lifecycle status, and the in-flight action record.
//!
//! `EmployeeAction` is the single mutable record the lifecycle controller
//! drives through the state machine. Everything else in this module is
//! identity newtypes and the status enum whose `can_transition_to` method
//! encodes the only legal edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::Sensitivity;

/// Unique identifier for a single proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub uuid::Uuid);

impl ActionId {
    /// Create a new, unique action ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable identifier for the AI employee that owns an engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The workspace an employee operates in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle status of an action.
///
/// Legal edges (terminal states marked):
///
/// ```text
/// pending   → approved | rejected(T) | cancelled(T)
/// approved  → executing | cancelled(T)
/// executing → completed(T) | approved (retry loop) | failed(T)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Approved,
    Executing,
    Completed,
    Failed,
    Rejected,
    Cancelled,
}

impl ActionStatus {
    /// True for statuses from which no further transition is legal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Rejected | Self::Cancelled
        )
    }

    /// Return true if moving from `self` to `next` is a legal edge.
    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        use ActionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Executing)
                | (Approved, Cancelled)
                | (Executing, Completed)
                | (Executing, Approved)
                | (Executing, Failed)
        )
    }

    /// Snake_case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller's request to create an action.
///
/// Built with `ActionRequest::new` plus `with_*` builders; everything the
/// trust ledger needs for its decision travels with the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Name of the action type; must exist in the `ActionCatalog`.
    pub action_type: String,
    /// Opaque parameter bag, validated against the type's `ActionDefinition`.
    pub parameters: Map<String, Value>,
    /// The contact this action concerns, when one exists.
    pub contact_id: Option<String>,
    /// True when the employee has never interacted with this contact before.
    pub is_new_contact: bool,
    /// Declared content sensitivity of the action's payload.
    pub sensitivity: Sensitivity,
    /// Defer execution until this time (checked on each execution request).
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Override the engine's default retry ceiling for this action.
    pub max_retries: Option<u32>,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            parameters: Map::new(),
            contact_id: None,
            is_new_contact: false,
            sensitivity: Sensitivity::Low,
            scheduled_for: None,
            max_retries: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_contact(mut self, contact_id: impl Into<String>, is_new: bool) -> Self {
        self.contact_id = Some(contact_id.into());
        self.is_new_contact = is_new;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// One proposed action, owned and mutated only by the lifecycle controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAction {
    pub id: ActionId,
    pub employee_id: EmployeeId,
    pub workspace_id: WorkspaceId,
    pub action_type: String,
    /// Opaque key → value map, validated at creation against the action's
    /// `ActionDefinition` (and its JSON Schema when one is declared).
    pub parameters: Map<String, Value>,
    pub status: ActionStatus,
    /// Confidence score from the trust decision, always within [0, 1].
    pub confidence: f64,
    /// True when a human must approve before execution.
    pub requires_approval: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    /// When set to a future time, execution is deferred until then.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Execution attempts that have failed so far.
    pub retry_count: u32,
    /// Retry ceiling; once `retry_count` reaches it the action is `Failed`.
    pub max_retries: u32,
    /// Handler result payload on success.
    pub result: Option<Value>,
    /// Last execution error, preserved for audit.
    pub error: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeAction {
    /// Construct a fresh action record in its initial status.
    ///
    /// `status` must be `Pending` (approval required) or `Approved`
    /// (auto-approved); the lifecycle controller enforces this.
    pub fn new(
        employee_id: EmployeeId,
        workspace_id: WorkspaceId,
        request: ActionRequest,
        status: ActionStatus,
        confidence: f64,
        requires_approval: bool,
        max_retries: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ActionId::new(),
            employee_id,
            workspace_id,
            action_type: request.action_type,
            parameters: request.parameters,
            status,
            confidence,
            requires_approval,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejection_reason: None,
            rejected_at: None,
            scheduled_for: request.scheduled_for,
            retry_count: 0,
            max_retries,
            result: None,
            error: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. Called by the controller on every mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// True when `scheduled_for` is set to a time that has not arrived yet.
    pub fn is_deferred(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_for.is_some_and(|at| at > now)
    }
}
