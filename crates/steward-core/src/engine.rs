//! The STEWARD lifecycle controller: the trust-gated action runner.
//!
//! The engine enforces the STEWARD execution model:
//!
//!   Request → Validate → Trust decision → Queue → [Approval] → Execute → Audit
//!
//! The trust invariant is absolute: `ActionHandler::execute()` is NEVER
//! called unless the action is in `Approved` status — which is only reachable
//! through an explicit human approval or a trust-ledger auto-approval. This
//! is enforced structurally: the code path to the handler is only reachable
//! after the status check passes under the queue lock.
//!
//! One engine instance exists per (employee, workspace) pair, owning that
//! employee's queue, trust ledger, and audit trail. The engine is cheaply
//! cloneable; clones share state and may be used concurrently. The queue
//! lock is never held across a handler await, so actions with different ids
//! make progress in parallel while operations on one id stay serialized.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use steward_contracts::action::{
    ActionId, ActionRequest, ActionStatus, EmployeeAction, EmployeeId, WorkspaceId,
};
use steward_contracts::audit::{AuditEntry, AuditEventKind, AuditQuery};
use steward_contracts::catalog::ActionCatalog;
use steward_contracts::error::{StewardError, StewardResult};
use steward_contracts::trust::{ActionOutcome, EvaluationContext, TrustConfig, TrustMetrics};
use steward_trust::TrustLedger;

use crate::registry::HandlerRegistry;
use crate::store::InMemoryActionStore;
use crate::traits::{ActionHandler, ActionStore, AuditSink};
use crate::validation::validate_parameters;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum live entries in the queue (terminal entries count until
    /// evicted by `clear_completed`).
    pub capacity: usize,
    /// Base retry delay; attempt `n` is retried after `retry_delay_ms × n`
    /// (linear backoff).
    pub retry_delay_ms: u64,
    /// Retry ceiling for actions whose request does not override it.
    pub default_max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            retry_delay_ms: 1000,
            default_max_retries: 3,
        }
    }
}

/// Counts by status and by action type for the live queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub by_status: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
}

struct EngineInner {
    employee_id: EmployeeId,
    workspace_id: WorkspaceId,
    config: EngineConfig,
    catalog: Arc<ActionCatalog>,
    registry: RwLock<HandlerRegistry>,
    store: Mutex<Box<dyn ActionStore>>,
    ledger: Mutex<TrustLedger>,
    audit: Arc<dyn AuditSink>,
}

/// The action queue and lifecycle controller for one employee.
#[derive(Clone)]
pub struct ActionEngine {
    inner: Arc<EngineInner>,
}

impl ActionEngine {
    /// An engine with the built-in catalog, default config, default trust
    /// ledger, and the in-memory store.
    pub fn new(
        employee_id: EmployeeId,
        workspace_id: WorkspaceId,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self::with_parts(
            employee_id,
            workspace_id,
            EngineConfig::default(),
            Arc::new(ActionCatalog::builtin()),
            TrustLedger::with_defaults(),
            Box::new(InMemoryActionStore::new()),
            audit,
        )
    }

    /// Full constructor: every collaborator injected.
    pub fn with_parts(
        employee_id: EmployeeId,
        workspace_id: WorkspaceId,
        config: EngineConfig,
        catalog: Arc<ActionCatalog>,
        ledger: TrustLedger,
        store: Box<dyn ActionStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                employee_id,
                workspace_id,
                config,
                catalog,
                registry: RwLock::new(HandlerRegistry::new()),
                store: Mutex::new(store),
                ledger: Mutex::new(ledger),
                audit,
            }),
        }
    }

    /// Register a handler for an action type. Usually done at startup by the
    /// hosting application; safe at any time.
    pub fn register_handler(
        &self,
        action_type: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) {
        self.inner
            .registry
            .write()
            .expect("handler registry lock poisoned")
            .register(action_type, handler);
    }

    // ── Lifecycle operations ──────────────────────────────────────────────────

    /// Propose a new action.
    ///
    /// # Pipeline
    ///
    /// 1. The action type must exist in the catalog and the parameters must
    ///    pass the catalog checks; a registered handler's own `validate()`
    ///    runs as well. Any failure → `Validation`, no state created.
    /// 2. The trust ledger evaluates the request.
    /// 3. The queue must have room → else `CapacityExceeded`, no state
    ///    created.
    /// 4. The action is stored as `Pending` (approval required) or
    ///    `Approved` (auto), and a `created` audit entry written.
    /// 5. An auto-approved action begins executing on a spawned task; the
    ///    caller is not blocked on the handler.
    pub async fn create_action(&self, request: ActionRequest) -> StewardResult<EmployeeAction> {
        let definition = self
            .inner
            .catalog
            .get(&request.action_type)
            .cloned()
            .ok_or_else(|| StewardError::Validation {
                reason: format!("unknown action type '{}'", request.action_type),
            })?;

        validate_parameters(&definition, &request.parameters)?;

        if let Some(handler) = self.handler(&request.action_type) {
            let problems = handler.validate(&request.parameters);
            if !problems.is_empty() {
                return Err(StewardError::Validation {
                    reason: format!("handler rejected parameters: {}", problems.join("; ")),
                });
            }
        }

        let decision = {
            let ledger = self.lock_ledger();
            ledger.evaluate(
                &EvaluationContext {
                    action_type: request.action_type.clone(),
                    contact_id: request.contact_id.clone(),
                    is_new_contact: request.is_new_contact,
                    sensitivity: request.sensitivity,
                },
                &definition,
            )
        };

        let status = if decision.requires_approval {
            ActionStatus::Pending
        } else {
            ActionStatus::Approved
        };
        let max_retries = request
            .max_retries
            .unwrap_or(self.inner.config.default_max_retries);

        let action = {
            let mut store = self.lock_store();
            if store.len() >= self.inner.config.capacity {
                return Err(StewardError::CapacityExceeded {
                    capacity: self.inner.config.capacity,
                });
            }
            let action = EmployeeAction::new(
                self.inner.employee_id.clone(),
                self.inner.workspace_id.clone(),
                request,
                status,
                decision.confidence,
                decision.requires_approval,
                max_retries,
            );
            store.insert(action.clone());
            action
        };

        info!(
            action_id = %action.id,
            action_type = %action.action_type,
            employee_id = %self.inner.employee_id,
            requires_approval = action.requires_approval,
            confidence = action.confidence,
            "action created"
        );

        let created = AuditEntry::new(action.id, AuditEventKind::Created).with_detail(json!({
            "action_type": action.action_type,
            "requires_approval": action.requires_approval,
            "confidence": action.confidence,
            "trust_level": decision.level,
            "reason": decision.reason.clone(),
        }));
        if let Err(e) = self.audit(created) {
            // An action whose creation cannot be audited must not exist.
            self.lock_store().remove(&action.id);
            return Err(e);
        }

        if !action.requires_approval {
            self.audit(
                AuditEntry::new(action.id, AuditEventKind::AutoApproved)
                    .with_detail(json!({ "reason": decision.reason })),
            )?;
            let engine = self.clone();
            let id = action.id;
            tokio::spawn(async move {
                if let Err(e) = engine.execute_action(id).await {
                    error!(action_id = %id, error = %e, "auto-approved execution failed to start");
                }
            });
        }

        Ok(action)
    }

    /// Approve a pending action and execute it.
    ///
    /// Valid only from `Pending`. The approval is reported to the trust
    /// ledger immediately, and the call awaits the resulting execution
    /// attempt — the returned action reflects its outcome.
    pub async fn approve_action(
        &self,
        id: ActionId,
        approved_by: &str,
    ) -> StewardResult<EmployeeAction> {
        let (action_type, confidence) = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            // Executing → Approved is also a legal edge, but it belongs to
            // the retry path; approval itself is only defined from Pending.
            if action.status != ActionStatus::Pending {
                return Err(illegal("approve", action));
            }
            transition(action, ActionStatus::Approved, "approve")?;
            action.approved_by = Some(approved_by.to_string());
            action.approved_at = Some(Utc::now());
            (action.action_type.clone(), action.confidence)
        };

        info!(action_id = %id, approved_by, "action approved");
        self.audit(AuditEntry::new(id, AuditEventKind::Approved).with_actor(approved_by))?;
        self.lock_ledger()
            .record_outcome(&action_type, ActionOutcome::approved(confidence));

        self.execute_action(id).await
    }

    /// Reject a pending action. Valid only from `Pending`; terminal.
    pub fn reject_action(
        &self,
        id: ActionId,
        rejected_by: &str,
        reason: &str,
    ) -> StewardResult<EmployeeAction> {
        let snapshot = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            transition(action, ActionStatus::Rejected, "reject")?;
            action.rejected_by = Some(rejected_by.to_string());
            action.rejection_reason = Some(reason.to_string());
            action.rejected_at = Some(Utc::now());
            action.clone()
        };

        info!(action_id = %id, rejected_by, reason, "action rejected");
        self.audit(
            AuditEntry::new(id, AuditEventKind::Rejected)
                .with_actor(rejected_by)
                .with_detail(json!({ "reason": reason })),
        )?;
        self.lock_ledger()
            .record_outcome(&snapshot.action_type, ActionOutcome::rejected(snapshot.confidence));

        Ok(snapshot)
    }

    /// Execute an approved action.
    ///
    /// Valid only from `Approved`. A future `scheduled_for` leaves the
    /// action untouched (it is checked again on the next request). A missing
    /// handler is a terminal failure, never retried. Handler failures are
    /// retried with linear backoff up to the action's retry ceiling; the
    /// resulting state is recorded on the action and in the audit log, not
    /// surfaced as an error.
    pub async fn execute_action(&self, id: ActionId) -> StewardResult<EmployeeAction> {
        enum Step {
            Deferred(EmployeeAction),
            NoHandler(EmployeeAction),
            Run(EmployeeAction, Arc<dyn ActionHandler>),
        }

        let step = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            if !action.status.can_transition_to(ActionStatus::Executing) {
                return Err(illegal("execute", action));
            }
            if action.is_deferred(Utc::now()) {
                Step::Deferred(action.clone())
            } else if let Some(handler) = self.handler(&action.action_type) {
                transition(action, ActionStatus::Executing, "execute")?;
                Step::Run(action.clone(), handler)
            } else {
                // The attempt still passes through Executing so the terminal
                // state is reached over legal edges.
                transition(action, ActionStatus::Executing, "execute")?;
                transition(action, ActionStatus::Failed, "execute")?;
                action.error = Some(format!(
                    "no handler registered for action type '{}'",
                    action.action_type
                ));
                Step::NoHandler(action.clone())
            }
        };

        match step {
            Step::Deferred(action) => {
                debug!(
                    action_id = %id,
                    scheduled_for = ?action.scheduled_for,
                    "execution deferred until scheduled time"
                );
                Ok(action)
            }
            Step::NoHandler(action) => {
                warn!(
                    action_id = %id,
                    action_type = %action.action_type,
                    "no handler registered, action failed"
                );
                self.audit(
                    AuditEntry::new(id, AuditEventKind::Failed)
                        .with_detail(json!({ "error": action.error.clone() })),
                )?;
                Ok(action)
            }
            Step::Run(action, handler) => {
                // The execution claim must not outlive a failed audit write,
                // or the action would be stranded in Executing forever.
                if let Err(e) = self.audit(AuditEntry::new(id, AuditEventKind::ExecutionStarted)) {
                    self.release_execution_claim(id);
                    return Err(e);
                }
                debug!(
                    action_id = %id,
                    action_type = %action.action_type,
                    attempt = action.retry_count + 1,
                    "invoking handler"
                );
                // The queue lock is NOT held here — other actions proceed
                // while the handler runs.
                match handler.execute(&action).await {
                    Ok(result) => self.complete_execution(id, result),
                    Err(e) => self.handle_execution_failure(id, e.to_string()),
                }
            }
        }
    }

    /// Cancel a pending or approved action. Terminal.
    ///
    /// Cancellation only prevents future execution attempts — a handler
    /// already in flight is not interrupted, and a retry timer that fires
    /// after cancellation is a no-op.
    pub fn cancel_action(&self, id: ActionId) -> StewardResult<EmployeeAction> {
        let snapshot = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            transition(action, ActionStatus::Cancelled, "cancel")?;
            action.clone()
        };

        info!(action_id = %id, "action cancelled");
        self.audit(AuditEntry::new(id, AuditEventKind::Cancelled))?;
        Ok(snapshot)
    }

    /// Roll back a completed, reversible action.
    ///
    /// Requires `Completed` status, a catalog definition marked reversible,
    /// and a registered handler that implements rollback. A rollback failure
    /// is recorded as `rollback_failed` and returned as an error, but the
    /// action keeps its `Completed` status — the side effect may be
    /// partially undone.
    pub async fn rollback_action(&self, id: ActionId) -> StewardResult<EmployeeAction> {
        let snapshot = {
            let store = self.lock_store();
            let action = store
                .get(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            if action.status != ActionStatus::Completed {
                return Err(illegal("roll back", action));
            }
            action.clone()
        };

        let definition =
            self.inner
                .catalog
                .get(&snapshot.action_type)
                .ok_or_else(|| StewardError::Validation {
                    reason: format!("unknown action type '{}'", snapshot.action_type),
                })?;
        if !definition.reversible {
            return Err(StewardError::IllegalTransition {
                operation: format!(
                    "roll back irreversible action type '{}'",
                    snapshot.action_type
                ),
                action_id: id,
                status: snapshot.status,
            });
        }

        let handler =
            self.handler(&snapshot.action_type)
                .ok_or_else(|| StewardError::HandlerMissing {
                    action_type: snapshot.action_type.clone(),
                })?;
        if !handler.supports_rollback() {
            return Err(StewardError::RollbackFailed {
                reason: format!(
                    "handler for '{}' does not implement rollback",
                    snapshot.action_type
                ),
            });
        }

        match handler.rollback(&snapshot).await {
            Ok(()) => {
                info!(action_id = %id, action_type = %snapshot.action_type, "action rolled back");
                self.audit(AuditEntry::new(id, AuditEventKind::RolledBack))?;
                Ok(self.get_action(id).unwrap_or(snapshot))
            }
            Err(e) => {
                warn!(action_id = %id, error = %e, "rollback failed");
                self.audit(
                    AuditEntry::new(id, AuditEventKind::RollbackFailed)
                        .with_detail(json!({ "error": e.to_string() })),
                )?;
                Err(StewardError::RollbackFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    // ── Execution outcomes ────────────────────────────────────────────────────

    /// Put an action claimed for execution back to `Approved`.
    ///
    /// Used when an attempt has to be abandoned after the status was already
    /// moved to `Executing` but before the handler ran.
    fn release_execution_claim(&self, id: ActionId) {
        let mut store = self.lock_store();
        if let Some(action) = store.get_mut(&id) {
            if action.status == ActionStatus::Executing {
                let _ = transition(action, ActionStatus::Approved, "release execution claim");
            }
        }
    }

    fn complete_execution(&self, id: ActionId, result: Value) -> StewardResult<EmployeeAction> {
        let snapshot = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            // Raced with eviction or an external mutation — do not overwrite.
            if action.status != ActionStatus::Executing {
                return Ok(action.clone());
            }
            transition(action, ActionStatus::Completed, "complete")?;
            action.result = Some(result);
            action.executed_at = Some(Utc::now());
            action.error = None;
            action.clone()
        };

        info!(
            action_id = %id,
            action_type = %snapshot.action_type,
            auto_approved = !snapshot.requires_approval,
            "action completed"
        );
        self.audit(AuditEntry::new(id, AuditEventKind::Completed))?;

        // Manual approvals were already recorded at approval time; only the
        // autonomous path reports its outcome here.
        if !snapshot.requires_approval {
            self.lock_ledger().record_outcome(
                &snapshot.action_type,
                ActionOutcome::auto_approved(snapshot.confidence),
            );
        }

        Ok(snapshot)
    }

    fn handle_execution_failure(
        &self,
        id: ActionId,
        error: String,
    ) -> StewardResult<EmployeeAction> {
        let (snapshot, retry_in) = {
            let mut store = self.lock_store();
            let action = store
                .get_mut(&id)
                .ok_or(StewardError::NotFound { action_id: id })?;
            if action.status != ActionStatus::Executing {
                return Ok(action.clone());
            }
            action.retry_count += 1;
            action.error = Some(error.clone());
            if action.retry_count >= action.max_retries {
                transition(action, ActionStatus::Failed, "record failure")?;
                (action.clone(), None)
            } else {
                // Back to Approved so the retry timer can re-execute it.
                transition(action, ActionStatus::Approved, "schedule retry")?;
                let delay = Duration::from_millis(
                    self.inner
                        .config
                        .retry_delay_ms
                        .saturating_mul(action.retry_count as u64),
                );
                (action.clone(), Some(delay))
            }
        };

        match retry_in {
            None => {
                warn!(
                    action_id = %id,
                    attempts = snapshot.retry_count,
                    error = %error,
                    "action failed terminally"
                );
                self.audit(AuditEntry::new(id, AuditEventKind::Failed).with_detail(json!({
                    "error": error,
                    "attempts": snapshot.retry_count,
                })))?;
            }
            Some(delay) => {
                info!(
                    action_id = %id,
                    next_attempt = snapshot.retry_count + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retry scheduled"
                );
                self.audit(
                    AuditEntry::new(id, AuditEventKind::RetryScheduled).with_detail(json!({
                        "delay_ms": delay.as_millis() as u64,
                        "next_attempt": snapshot.retry_count + 1,
                        "error": error,
                    })),
                )?;

                let engine = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // The action may have been cancelled (or evicted) while
                    // the timer was pending; a stale retry must be a no-op.
                    match engine.get_action(id) {
                        Some(action) if action.status == ActionStatus::Approved => {
                            if let Err(e) = engine.execute_action(id).await {
                                error!(action_id = %id, error = %e, "scheduled retry could not run");
                            }
                        }
                        _ => debug!(action_id = %id, "stale retry skipped"),
                    }
                });
            }
        }

        Ok(snapshot)
    }

    // ── Query surface ─────────────────────────────────────────────────────────

    pub fn get_action(&self, id: ActionId) -> Option<EmployeeAction> {
        self.lock_store().get(&id).cloned()
    }

    /// Pending actions, oldest first.
    pub fn pending_actions(&self) -> Vec<EmployeeAction> {
        self.actions_by_status(ActionStatus::Pending)
    }

    /// Actions in `status`, oldest first.
    pub fn actions_by_status(&self, status: ActionStatus) -> Vec<EmployeeAction> {
        let store = self.lock_store();
        let mut actions: Vec<EmployeeAction> = store
            .all()
            .into_iter()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.created_at);
        actions
    }

    /// The most recently created actions, newest first.
    pub fn recent_actions(&self, limit: usize) -> Vec<EmployeeAction> {
        let store = self.lock_store();
        let mut actions: Vec<EmployeeAction> = store.all().into_iter().cloned().collect();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        actions.truncate(limit);
        actions
    }

    /// Counts by status and by action type over the live queue.
    pub fn stats(&self) -> QueueStats {
        let store = self.lock_store();
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut by_type: HashMap<String, usize> = HashMap::new();
        let mut total = 0;
        for action in store.all() {
            total += 1;
            *by_status.entry(action.status.as_str().to_string()).or_default() += 1;
            *by_type.entry(action.action_type.clone()).or_default() += 1;
        }
        QueueStats {
            total,
            by_status,
            by_type,
        }
    }

    /// Retrieve audit entries, filtered by action id / event / limit.
    pub fn audit_log(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        self.inner.audit.query(query)
    }

    /// Evict all terminal actions from the live queue; returns the count.
    /// Audit history is independent and unaffected.
    pub fn clear_completed(&self) -> usize {
        let mut store = self.lock_store();
        let ids: Vec<ActionId> = store
            .all()
            .into_iter()
            .filter(|a| a.status.is_terminal())
            .map(|a| a.id)
            .collect();
        for id in &ids {
            store.remove(id);
        }
        debug!(evicted = ids.len(), "cleared terminal actions");
        ids.len()
    }

    // ── Trust surface ─────────────────────────────────────────────────────────

    /// Replace the trust configuration at runtime.
    pub fn update_trust_config(&self, config: TrustConfig) {
        self.lock_ledger().update_config(config);
    }

    pub fn trust_metrics(&self, action_type: &str) -> Option<TrustMetrics> {
        self.lock_ledger().metrics(action_type).cloned()
    }

    /// Full metrics snapshot for the persistence collaborator.
    pub fn trust_snapshot(&self) -> HashMap<String, TrustMetrics> {
        self.lock_ledger().snapshot()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock_store(&self) -> MutexGuard<'_, Box<dyn ActionStore>> {
        self.inner.store.lock().expect("action store lock poisoned")
    }

    fn lock_ledger(&self) -> MutexGuard<'_, TrustLedger> {
        self.inner.ledger.lock().expect("trust ledger lock poisoned")
    }

    fn handler(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.inner
            .registry
            .read()
            .expect("handler registry lock poisoned")
            .get(action_type)
    }

    fn audit(&self, entry: AuditEntry) -> StewardResult<()> {
        self.inner.audit.record(entry)
    }
}

fn illegal(operation: &str, action: &EmployeeAction) -> StewardError {
    StewardError::IllegalTransition {
        operation: operation.to_string(),
        action_id: action.id,
        status: action.status,
    }
}

/// Move `action` to `next`, enforcing the legal edge set.
///
/// The single authority for status mutation: every engine operation goes
/// through here, so the edges encoded in `ActionStatus::can_transition_to`
/// cannot drift from the ones the engine actually takes.
fn transition(
    action: &mut EmployeeAction,
    next: ActionStatus,
    operation: &str,
) -> StewardResult<()> {
    if !action.status.can_transition_to(next) {
        return Err(illegal(operation, action));
    }
    debug!(
        action_id = %action.id,
        from = %action.status,
        to = %next,
        "status transition"
    );
    action.status = next;
    action.touch();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::Map;

    use steward_contracts::trust::TrustLevel;

    use super::*;

    // ── Test doubles ──────────────────────────────────────────────────────────

    struct MockAuditSink {
        entries: Mutex<Vec<AuditEntry>>,
    }

    impl MockAuditSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(Vec::new()),
            })
        }

        fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn count(&self, event: AuditEventKind) -> usize {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.event == event)
                .count()
        }

        fn events_for(&self, id: ActionId) -> Vec<AuditEventKind> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.action_id == id)
                .map(|e| e.event)
                .collect()
        }
    }

    impl AuditSink for MockAuditSink {
        fn record(&self, entry: AuditEntry) -> StewardResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
            let entries = self.entries.lock().unwrap();
            let mut matched: Vec<AuditEntry> = entries
                .iter()
                .filter(|e| {
                    query.action_id.map_or(true, |id| e.action_id == id)
                        && query.event.map_or(true, |ev| e.event == ev)
                })
                .cloned()
                .collect();
            if let Some(limit) = query.limit {
                if matched.len() > limit {
                    matched.drain(..matched.len() - limit);
                }
            }
            matched
        }
    }

    struct OkHandler {
        calls: AtomicU32,
    }

    impl OkHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ActionHandler for OkHandler {
        async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "delivered": true }))
        }
    }

    struct FailingHandler {
        calls: AtomicU32,
    }

    impl FailingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ActionHandler for FailingHandler {
        async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StewardError::HandlerExecution {
                reason: "upstream API returned 500".to_string(),
            })
        }
    }

    struct StrictValidator;

    #[async_trait]
    impl ActionHandler for StrictValidator {
        async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
            Ok(Value::Null)
        }

        fn validate(&self, _parameters: &Map<String, Value>) -> Vec<String> {
            vec!["recipient must be an email address".to_string()]
        }
    }

    struct ReversibleHandler {
        rolled_back: AtomicBool,
        fail_rollback: bool,
    }

    impl ReversibleHandler {
        fn new(fail_rollback: bool) -> Arc<Self> {
            Arc::new(Self {
                rolled_back: AtomicBool::new(false),
                fail_rollback,
            })
        }
    }

    #[async_trait]
    impl ActionHandler for ReversibleHandler {
        async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
            Ok(json!({ "logged": true }))
        }

        fn supports_rollback(&self) -> bool {
            true
        }

        async fn rollback(&self, _action: &EmployeeAction) -> StewardResult<()> {
            if self.fail_rollback {
                return Err(StewardError::HandlerExecution {
                    reason: "undo endpoint unavailable".to_string(),
                });
            }
            self.rolled_back.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingEventSink {
        fail_on: AuditEventKind,
        entries: Mutex<Vec<AuditEntry>>,
    }

    impl FailingEventSink {
        fn new(fail_on: AuditEventKind) -> Arc<Self> {
            Arc::new(Self {
                fail_on,
                entries: Mutex::new(Vec::new()),
            })
        }
    }

    impl AuditSink for FailingEventSink {
        fn record(&self, entry: AuditEntry) -> StewardResult<()> {
            if entry.event == self.fail_on {
                return Err(StewardError::AuditWriteFailed {
                    reason: "audit sink unavailable".to_string(),
                });
            }
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| query.action_id.map_or(true, |id| e.action_id == id))
                .cloned()
                .collect()
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl ActionHandler for SlowHandler {
        async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Value::Null)
        }
    }

    // ── Harness ───────────────────────────────────────────────────────────────

    fn engine_with(
        audit: Arc<MockAuditSink>,
        config: EngineConfig,
        trust: TrustConfig,
    ) -> ActionEngine {
        ActionEngine::with_parts(
            EmployeeId("emp-1".to_string()),
            WorkspaceId("ws-1".to_string()),
            config,
            Arc::new(ActionCatalog::builtin()),
            TrustLedger::new(trust),
            Box::new(InMemoryActionStore::new()),
            audit,
        )
    }

    fn default_engine(audit: Arc<MockAuditSink>) -> ActionEngine {
        engine_with(audit, EngineConfig::default(), TrustConfig::default())
    }

    fn autonomous_for(action_type: &str) -> TrustConfig {
        let mut config = TrustConfig::default();
        config
            .overrides
            .insert(action_type.to_string(), TrustLevel::Autonomous);
        config
    }

    fn task_request() -> ActionRequest {
        ActionRequest::new("create_task").with_parameter("title", json!("follow up with lead"))
    }

    fn log_request() -> ActionRequest {
        ActionRequest::new("log_interaction")
            .with_parameter("contact_id", json!("c-42"))
            .with_parameter("summary", json!("intro call"))
    }

    async fn wait_for_status(
        engine: &ActionEngine,
        id: ActionId,
        status: ActionStatus,
    ) -> EmployeeAction {
        for _ in 0..300 {
            if let Some(action) = engine.get_action(id) {
                if action.status == status {
                    return action;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("action {id} never reached status {status}");
    }

    // ── Approval flow ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn approval_flow_runs_to_completion() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        let handler = OkHandler::new();
        engine.register_handler("create_task", handler.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.requires_approval);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

        let done = engine.approve_action(action.id, "manager@acme").await.unwrap();
        assert_eq!(done.status, ActionStatus::Completed);
        assert_eq!(done.approved_by.as_deref(), Some("manager@acme"));
        assert_eq!(done.result, Some(json!({ "delivered": true })));
        assert!(done.executed_at.is_some());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            audit.events_for(action.id),
            vec![
                AuditEventKind::Created,
                AuditEventKind::Approved,
                AuditEventKind::ExecutionStarted,
                AuditEventKind::Completed,
            ]
        );

        let metrics = engine.trust_metrics("create_task").unwrap();
        assert_eq!(metrics.total_actions, 1);
        assert_eq!(metrics.approved_count, 1);
        assert_eq!(metrics.auto_approved_count, 0);
    }

    #[tokio::test]
    async fn rejection_is_terminal_and_recorded() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let rejected = engine
            .reject_action(action.id, "manager@acme", "wrong assignee")
            .unwrap();
        assert_eq!(rejected.status, ActionStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong assignee"));
        assert!(rejected.rejected_at.is_some());

        let entries = audit.query(&AuditQuery::for_action(action.id).with_event(AuditEventKind::Rejected));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor.as_deref(), Some("manager@acme"));

        let metrics = engine.trust_metrics("create_task").unwrap();
        assert_eq!(metrics.rejected_count, 1);

        // Terminal: neither approval nor cancellation applies anymore.
        assert!(matches!(
            engine.approve_action(action.id, "manager@acme").await,
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.cancel_action(action.id),
            Err(StewardError::IllegalTransition { .. })
        ));
    }

    // ── Autonomous flow ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn autonomous_action_executes_without_approval() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("log_interaction"),
        );
        engine.register_handler("log_interaction", OkHandler::new());

        let action = engine.create_action(log_request()).await.unwrap();
        assert_eq!(action.status, ActionStatus::Approved);
        assert!(!action.requires_approval);

        let done = wait_for_status(&engine, action.id, ActionStatus::Completed).await;
        assert!(done.approved_by.is_none());
        assert_eq!(audit.count(AuditEventKind::AutoApproved), 1);

        let metrics = engine.trust_metrics("log_interaction").unwrap();
        assert_eq!(metrics.total_actions, 1);
        assert_eq!(metrics.auto_approved_count, 1);
    }

    #[tokio::test]
    async fn critical_risk_overrides_autonomous_trust() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("custom"),
        );
        engine.register_handler("custom", OkHandler::new());

        let action = engine.create_action(ActionRequest::new("custom")).await.unwrap();
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.requires_approval);
        assert_eq!(audit.count(AuditEventKind::AutoApproved), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn new_contact_requires_approval_under_high_trust() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("log_interaction"),
        );
        engine.register_handler("log_interaction", OkHandler::new());

        let request = log_request().with_contact("c-new", true);
        let action = engine.create_action(request).await.unwrap();
        assert_eq!(action.status, ActionStatus::Pending);
        assert!(action.requires_approval);
    }

    // ── Retry flow ────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn failing_handler_retries_then_fails_terminally() {
        let audit = MockAuditSink::new();
        let config = EngineConfig {
            retry_delay_ms: 100,
            ..EngineConfig::default()
        };
        let engine = engine_with(audit.clone(), config, TrustConfig::default());
        let handler = FailingHandler::new();
        engine.register_handler("create_task", handler.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let after_first = engine.approve_action(action.id, "manager@acme").await.unwrap();
        assert_eq!(after_first.status, ActionStatus::Approved);
        assert_eq!(after_first.retry_count, 1);

        let failed = wait_for_status(&engine, action.id, ActionStatus::Failed).await;
        assert_eq!(failed.retry_count, 3);
        assert!(failed.error.as_deref().unwrap().contains("upstream API"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);

        let retries = audit.query(
            &AuditQuery::for_action(action.id).with_event(AuditEventKind::RetryScheduled),
        );
        assert_eq!(retries.len(), 2);
        // Linear backoff: delay grows with the attempt count.
        let delays: Vec<u64> = retries
            .iter()
            .map(|e| e.detail.as_ref().unwrap()["delay_ms"].as_u64().unwrap())
            .collect();
        assert_eq!(delays, vec![100, 200]);
        assert_eq!(audit.count(AuditEventKind::Failed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_retries_stops_execution() {
        let audit = MockAuditSink::new();
        let config = EngineConfig {
            retry_delay_ms: 100,
            ..EngineConfig::default()
        };
        let engine = engine_with(audit.clone(), config, TrustConfig::default());
        let handler = FailingHandler::new();
        engine.register_handler("create_task", handler.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let after_first = engine.approve_action(action.id, "manager@acme").await.unwrap();
        assert_eq!(after_first.status, ActionStatus::Approved);

        // Cancel while the retry timer is pending; the timer must no-op.
        let cancelled = engine.cancel_action(action.id).unwrap();
        assert_eq!(cancelled.status, ActionStatus::Cancelled);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            engine.get_action(action.id).unwrap().status,
            ActionStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn missing_handler_fails_without_retry() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let failed = engine.approve_action(action.id, "manager@acme").await.unwrap();
        assert_eq!(failed.status, ActionStatus::Failed);
        assert_eq!(failed.retry_count, 0);
        assert!(failed.error.as_deref().unwrap().contains("no handler registered"));
        assert_eq!(audit.count(AuditEventKind::RetryScheduled), 0);
        assert_eq!(audit.count(AuditEventKind::Failed), 1);
    }

    // ── Validation and capacity ───────────────────────────────────────────────

    #[tokio::test]
    async fn invalid_requests_create_no_state() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());

        assert!(matches!(
            engine.create_action(ActionRequest::new("teleport")).await,
            Err(StewardError::Validation { .. })
        ));
        assert!(matches!(
            engine.create_action(ActionRequest::new("create_task")).await,
            Err(StewardError::Validation { .. })
        ));

        assert_eq!(engine.stats().total, 0);
        assert_eq!(audit.len(), 0);
    }

    #[tokio::test]
    async fn handler_validator_can_veto_creation() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        engine.register_handler("create_task", Arc::new(StrictValidator));

        let err = engine.create_action(task_request()).await.unwrap_err();
        match err {
            StewardError::Validation { reason } => {
                assert!(reason.contains("handler rejected parameters"));
                assert!(reason.contains("email address"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(engine.stats().total, 0);
        assert_eq!(audit.len(), 0);
    }

    #[tokio::test]
    async fn capacity_is_enforced_atomically() {
        let audit = MockAuditSink::new();
        let config = EngineConfig {
            capacity: 1,
            ..EngineConfig::default()
        };
        let engine = engine_with(audit.clone(), config, TrustConfig::default());

        engine.create_action(task_request()).await.unwrap();
        let err = engine.create_action(task_request()).await.unwrap_err();
        assert!(matches!(err, StewardError::CapacityExceeded { capacity: 1 }));

        // No orphan audit entry for the rejected request.
        assert_eq!(audit.len(), 1);
        assert_eq!(engine.stats().total, 1);
    }

    #[tokio::test]
    async fn clearing_terminal_actions_frees_capacity() {
        let audit = MockAuditSink::new();
        let config = EngineConfig {
            capacity: 1,
            ..EngineConfig::default()
        };
        let engine = engine_with(audit.clone(), config, TrustConfig::default());

        let first = engine.create_action(task_request()).await.unwrap();
        engine.reject_action(first.id, "manager@acme", "duplicate").unwrap();

        assert_eq!(engine.clear_completed(), 1);
        assert!(engine.get_action(first.id).is_none());
        // Audit history survives eviction.
        assert!(!audit.query(&AuditQuery::for_action(first.id)).is_empty());

        engine.create_action(task_request()).await.unwrap();
        assert_eq!(engine.stats().total, 1);
    }

    #[tokio::test]
    async fn failed_audit_write_releases_the_execution_claim() {
        let audit = FailingEventSink::new(AuditEventKind::ExecutionStarted);
        let engine = ActionEngine::with_parts(
            EmployeeId("emp-1".to_string()),
            WorkspaceId("ws-1".to_string()),
            EngineConfig::default(),
            Arc::new(ActionCatalog::builtin()),
            TrustLedger::with_defaults(),
            Box::new(InMemoryActionStore::new()),
            audit,
        );
        let handler = OkHandler::new();
        engine.register_handler("create_task", handler.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let err = engine
            .approve_action(action.id, "manager@acme")
            .await
            .unwrap_err();
        assert!(matches!(err, StewardError::AuditWriteFailed { .. }));

        // The claim is unwound: the action is back to Approved, the handler
        // never ran, and the action stays operable instead of being stranded
        // in Executing.
        let current = engine.get_action(action.id).unwrap();
        assert_eq!(current.status, ActionStatus::Approved);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

        let cancelled = engine.cancel_action(action.id).unwrap();
        assert_eq!(cancelled.status, ActionStatus::Cancelled);
        assert_eq!(engine.clear_completed(), 1);
    }

    // ── State machine guards ──────────────────────────────────────────────────

    #[tokio::test]
    async fn illegal_transitions_are_rejected() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        engine.register_handler("create_task", OkHandler::new());

        let missing = ActionId::new();
        assert!(matches!(
            engine.approve_action(missing, "manager@acme").await,
            Err(StewardError::NotFound { .. })
        ));

        let action = engine.create_action(task_request()).await.unwrap();
        // Pending cannot execute directly.
        assert!(matches!(
            engine.execute_action(action.id).await,
            Err(StewardError::IllegalTransition { .. })
        ));

        let done = engine.approve_action(action.id, "manager@acme").await.unwrap();
        assert_eq!(done.status, ActionStatus::Completed);
        // Completed is terminal for approve/reject/cancel.
        assert!(matches!(
            engine.approve_action(action.id, "manager@acme").await,
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.reject_action(action.id, "manager@acme", "late"),
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.cancel_action(action.id),
            Err(StewardError::IllegalTransition { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn executing_actions_accept_no_lifecycle_operations() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("log_interaction"),
        );
        engine.register_handler("log_interaction", Arc::new(SlowHandler));

        let action = engine.create_action(log_request()).await.unwrap();
        wait_for_status(&engine, action.id, ActionStatus::Executing).await;

        assert!(matches!(
            engine.approve_action(action.id, "manager@acme").await,
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.reject_action(action.id, "manager@acme", "too late"),
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.cancel_action(action.id),
            Err(StewardError::IllegalTransition { .. })
        ));
        assert!(matches!(
            engine.execute_action(action.id).await,
            Err(StewardError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn pending_actions_can_be_cancelled() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());

        let action = engine.create_action(task_request()).await.unwrap();
        let cancelled = engine.cancel_action(action.id).unwrap();
        assert_eq!(cancelled.status, ActionStatus::Cancelled);
        assert_eq!(audit.count(AuditEventKind::Cancelled), 1);
    }

    // ── Scheduling ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn scheduled_actions_wait_for_their_time() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("create_task"),
        );
        let handler = OkHandler::new();
        engine.register_handler("create_task", handler.clone());

        let request = task_request().with_scheduled_for(Utc::now() + chrono::Duration::hours(1));
        let action = engine.create_action(request).await.unwrap();
        assert_eq!(action.status, ActionStatus::Approved);

        // The spawned auto-execution sees the future schedule and defers.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

        // An explicit drive before the scheduled time is also a no-op.
        let still_waiting = engine.execute_action(action.id).await.unwrap();
        assert_eq!(still_waiting.status, ActionStatus::Approved);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(audit.count(AuditEventKind::ExecutionStarted), 0);
    }

    // ── Rollback ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn completed_reversible_action_rolls_back() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("log_interaction"),
        );
        let handler = ReversibleHandler::new(false);
        engine.register_handler("log_interaction", handler.clone());

        let action = engine.create_action(log_request()).await.unwrap();
        wait_for_status(&engine, action.id, ActionStatus::Completed).await;

        let rolled = engine.rollback_action(action.id).await.unwrap();
        assert!(handler.rolled_back.load(Ordering::SeqCst));
        // Rollback records the undo; the action stays in its terminal status.
        assert_eq!(rolled.status, ActionStatus::Completed);
        assert_eq!(audit.count(AuditEventKind::RolledBack), 1);
    }

    #[tokio::test]
    async fn rollback_requires_completed_status() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        engine.register_handler("create_task", ReversibleHandler::new(false));

        let action = engine.create_action(task_request()).await.unwrap();
        assert!(matches!(
            engine.rollback_action(action.id).await,
            Err(StewardError::IllegalTransition { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn irreversible_types_cannot_roll_back() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("send_message"),
        );
        engine.register_handler("send_message", ReversibleHandler::new(false));

        let request = ActionRequest::new("send_message")
            .with_parameter("channel", json!("email"))
            .with_parameter("recipient", json!("lead@example.com"))
            .with_parameter("message", json!("hello"));
        let action = engine.create_action(request).await.unwrap();
        wait_for_status(&engine, action.id, ActionStatus::Completed).await;

        assert!(matches!(
            engine.rollback_action(action.id).await,
            Err(StewardError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn rollback_without_handler_support_fails() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        engine.register_handler("create_task", OkHandler::new());

        let action = engine.create_action(task_request()).await.unwrap();
        engine.approve_action(action.id, "manager@acme").await.unwrap();

        match engine.rollback_action(action.id).await {
            Err(StewardError::RollbackFailed { reason }) => {
                assert!(reason.contains("does not implement rollback"));
            }
            other => panic!("expected RollbackFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_rollback_is_audited_and_surfaced() {
        let audit = MockAuditSink::new();
        let engine = engine_with(
            audit.clone(),
            EngineConfig::default(),
            autonomous_for("log_interaction"),
        );
        engine.register_handler("log_interaction", ReversibleHandler::new(true));

        let action = engine.create_action(log_request()).await.unwrap();
        wait_for_status(&engine, action.id, ActionStatus::Completed).await;

        match engine.rollback_action(action.id).await {
            Err(StewardError::RollbackFailed { reason }) => {
                assert!(reason.contains("undo endpoint unavailable"));
            }
            other => panic!("expected RollbackFailed, got {other:?}"),
        }
        assert_eq!(audit.count(AuditEventKind::RollbackFailed), 1);
        assert_eq!(
            engine.get_action(action.id).unwrap().status,
            ActionStatus::Completed
        );
    }

    // ── Queries and runtime config ────────────────────────────────────────────

    #[tokio::test]
    async fn queue_queries_and_stats() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());

        let a = engine.create_action(task_request()).await.unwrap();
        let b = engine.create_action(task_request()).await.unwrap();
        let c = engine.create_action(log_request()).await.unwrap();

        let pending = engine.pending_actions();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].id, a.id);
        assert_eq!(pending[2].id, c.id);

        let recent = engine.recent_actions(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, c.id);
        assert_eq!(recent[1].id, b.id);

        let stats = engine.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status["pending"], 3);
        assert_eq!(stats.by_type["create_task"], 2);
        assert_eq!(stats.by_type["log_interaction"], 1);

        engine.reject_action(b.id, "manager@acme", "duplicate").unwrap();
        assert_eq!(engine.actions_by_status(ActionStatus::Rejected).len(), 1);
        assert_eq!(engine.clear_completed(), 1);
        assert_eq!(engine.stats().total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn trust_config_can_change_at_runtime() {
        let audit = MockAuditSink::new();
        let engine = default_engine(audit.clone());
        engine.register_handler("create_task", OkHandler::new());

        let before = engine.create_action(task_request()).await.unwrap();
        assert!(before.requires_approval);

        engine.update_trust_config(autonomous_for("create_task"));
        let after = engine.create_action(task_request()).await.unwrap();
        assert!(!after.requires_approval);
        wait_for_status(&engine, after.id, ActionStatus::Completed).await;
    }
}
