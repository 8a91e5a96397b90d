//! Scenario 1: Approval flow.
//!
//! A task-creation action is proposed under the default trust policy
//! (everything requires approval), sits in the pending queue, is approved by
//! a human, executes, and is finally rolled back.

use std::sync::Arc;

use serde_json::json;

use steward_contracts::action::{ActionRequest, ActionStatus};
use steward_contracts::error::StewardResult;
use steward_contracts::trust::TrustConfig;
use steward_core::EngineConfig;

use crate::handlers::TaskHandler;
use crate::scenarios::{build_engine, print_audit_trail, print_metrics, report_chain};

pub async fn run_scenario() -> StewardResult<()> {
    println!("Scenario 1: approval flow (create → approve → execute → rollback)");

    let (engine, audit) = build_engine(EngineConfig::default(), TrustConfig::default());
    engine.register_handler("create_task", Arc::new(TaskHandler));

    let request = ActionRequest::new("create_task")
        .with_parameter("title", json!("Prepare quarterly report"));
    let action = engine.create_action(request).await?;
    println!(
        "  proposed: {} status={} confidence={:.2}",
        action.id, action.status, action.confidence
    );
    println!("  pending queue size: {}", engine.pending_actions().len());

    let done = engine.approve_action(action.id, "demo-manager").await?;
    println!("  after approval: status={}", done.status);
    assert_eq!(done.status, ActionStatus::Completed);

    let rolled = engine.rollback_action(action.id).await?;
    println!("  after rollback: status={}", rolled.status);

    print_audit_trail(&engine, action.id);
    print_metrics(&engine, "create_task");
    report_chain(&audit);
    Ok(())
}
