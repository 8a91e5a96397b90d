//! Core trait definitions for the STEWARD lifecycle pipeline.
//!
//! These three traits define the engine's seams:
//!
//! - `ActionHandler` — untrusted side-effect executor (supplied by external
//!   collaborators such as a communication hub or CRM integration)
//! - `AuditSink`     — trusted sink (records every lifecycle event)
//! - `ActionStore`   — injected action storage (in-memory by default,
//!   durable in production)
//!
//! The lifecycle controller wires them together. A handler's `execute()` is
//! never called unless the trust gate has approved the action — either a
//! human approved it, or the trust ledger auto-approved it.

use async_trait::async_trait;
use serde_json::{Map, Value};

use steward_contracts::action::{ActionId, EmployeeAction};
use steward_contracts::audit::{AuditEntry, AuditQuery};
use steward_contracts::error::{StewardError, StewardResult};

/// An executor for one action type.
///
/// Implementations are considered **untrusted** — they wrap third-party
/// APIs, messaging channels, or arbitrary side effects. The engine guards
/// every call with the trust gate and the action state machine.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Perform the side effect and return a result payload.
    ///
    /// A returned error is retryable: the engine re-schedules the action
    /// with linear backoff until its retry ceiling, then marks it `Failed`.
    async fn execute(&self, action: &EmployeeAction) -> StewardResult<Value>;

    /// Synchronous parameter sanity check, invoked before an action is
    /// queued. Return one message per problem; an empty vec means valid.
    ///
    /// Runs in addition to the catalog's required-parameter and schema
    /// checks — handlers use this for constraints only they can know.
    fn validate(&self, parameters: &Map<String, Value>) -> Vec<String> {
        let _ = parameters;
        Vec::new()
    }

    /// True if this handler can undo a completed action.
    fn supports_rollback(&self) -> bool {
        false
    }

    /// Undo a completed, reversible action.
    ///
    /// Only called when `supports_rollback()` returns true, the action is
    /// `Completed`, and its definition marks the type reversible.
    async fn rollback(&self, action: &EmployeeAction) -> StewardResult<()> {
        Err(StewardError::RollbackFailed {
            reason: format!(
                "handler for '{}' does not implement rollback",
                action.action_type
            ),
        })
    }
}

/// The audit sink: the engine's append-only event record.
///
/// Every lifecycle event — creation, approval, rejection, execution,
/// retry, cancellation, rollback — produces exactly one `AuditEntry` that
/// must be persisted by this sink. A failed write is fatal for the
/// triggering operation.
pub trait AuditSink: Send + Sync {
    /// Append one entry. Implementations must treat this as append-only.
    fn record(&self, entry: AuditEntry) -> StewardResult<()>;

    /// Return entries matching `query`, oldest first, keeping the most
    /// recent `limit` matches when one is set.
    fn query(&self, query: &AuditQuery) -> Vec<AuditEntry>;
}

/// Injected storage for in-flight actions.
///
/// The engine serializes access itself (the store is kept behind the
/// engine's queue lock), so implementations are plain containers — the
/// in-memory map in [`crate::store::InMemoryActionStore`] is the reference.
/// Durable implementations belong to the persistence collaborator.
pub trait ActionStore: Send {
    fn insert(&mut self, action: EmployeeAction);

    fn get(&self, id: &ActionId) -> Option<&EmployeeAction>;

    fn get_mut(&mut self, id: &ActionId) -> Option<&mut EmployeeAction>;

    fn remove(&mut self, id: &ActionId) -> Option<EmployeeAction>;

    /// All stored actions in unspecified order.
    fn all(&self) -> Vec<&EmployeeAction>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
