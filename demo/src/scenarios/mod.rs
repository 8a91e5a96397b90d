//! Demo scenarios and shared helpers.

pub mod approval_flow;
pub mod autonomous_flow;
pub mod critical_override;
pub mod retry_flow;

use std::sync::Arc;
use std::time::Duration;

use steward_audit::InMemoryAuditLog;
use steward_contracts::action::{ActionId, ActionStatus, EmployeeId, WorkspaceId};
use steward_contracts::audit::AuditQuery;
use steward_contracts::catalog::ActionCatalog;
use steward_contracts::trust::TrustConfig;
use steward_core::{ActionEngine, EngineConfig, InMemoryActionStore};
use steward_trust::TrustLedger;

/// Build an engine wired to a hash-chained in-memory audit log.
///
/// Returns both so scenarios can verify chain integrity at the end.
pub fn build_engine(config: EngineConfig, trust: TrustConfig) -> (ActionEngine, Arc<InMemoryAuditLog>) {
    let audit = Arc::new(InMemoryAuditLog::new("demo-employee/demo-workspace"));
    let engine = ActionEngine::with_parts(
        EmployeeId("demo-employee".to_string()),
        WorkspaceId("demo-workspace".to_string()),
        config,
        Arc::new(ActionCatalog::builtin()),
        TrustLedger::new(trust),
        Box::new(InMemoryActionStore::new()),
        audit.clone(),
    );
    (engine, audit)
}

/// Poll until the action reaches `status` (or give up after a few seconds).
pub async fn wait_until(engine: &ActionEngine, id: ActionId, status: ActionStatus) {
    for _ in 0..100 {
        if engine
            .get_action(id)
            .map(|a| a.status == status)
            .unwrap_or(false)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    eprintln!("warning: action {} did not reach {} in time", id, status);
}

/// Print the audit trail for one action.
pub fn print_audit_trail(engine: &ActionEngine, id: ActionId) {
    println!("  audit trail:");
    for entry in engine.audit_log(&AuditQuery::for_action(id)) {
        let actor = entry.actor.as_deref().unwrap_or("-");
        println!("    {:<20} actor={}", entry.event.to_string(), actor);
    }
}

/// Print trust metrics for one action type.
pub fn print_metrics(engine: &ActionEngine, action_type: &str) {
    match engine.trust_metrics(action_type) {
        Some(m) => println!(
            "  trust[{}]: level={} total={} approved={} rejected={} auto={}",
            action_type,
            m.level,
            m.total_actions,
            m.approved_count,
            m.rejected_count,
            m.auto_approved_count
        ),
        None => println!("  trust[{}]: no history yet", action_type),
    }
}

/// Verify and report audit chain integrity.
pub fn report_chain(audit: &InMemoryAuditLog) {
    println!(
        "  audit chain: {} records, integrity {}",
        audit.len(),
        if audit.verify_integrity() { "OK" } else { "BROKEN" }
    );
    println!();
}
