//! Scenario 2: Autonomous flow.
//!
//! The trust policy grants the `log_interaction` type autonomous status, so
//! a proposed action auto-approves and executes in the background with no
//! human in the loop.  Escalation still applies: the same action for a
//! brand-new contact falls back to the pending queue.

use std::sync::Arc;

use serde_json::json;

use steward_contracts::action::{ActionRequest, ActionStatus};
use steward_contracts::error::StewardResult;
use steward_contracts::trust::{TrustConfig, TrustLevel};
use steward_core::EngineConfig;

use crate::handlers::LogHandler;
use crate::scenarios::{build_engine, print_metrics, report_chain, wait_until};

pub async fn run_scenario() -> StewardResult<()> {
    println!("Scenario 2: autonomous flow (auto-approval and escalation)");

    let mut trust = TrustConfig::default();
    trust
        .overrides
        .insert("log_interaction".to_string(), TrustLevel::Autonomous);

    let (engine, audit) = build_engine(EngineConfig::default(), trust);
    engine.register_handler("log_interaction", Arc::new(LogHandler));

    let request = ActionRequest::new("log_interaction")
        .with_parameter("contact_id", json!("c-1001"))
        .with_parameter("summary", json!("Discovery call, positive"))
        .with_contact("c-1001", false);
    let action = engine.create_action(request).await?;
    println!(
        "  proposed: requires_approval={} status={}",
        action.requires_approval, action.status
    );

    wait_until(&engine, action.id, ActionStatus::Completed).await;
    println!("  executed with no human in the loop");

    // Escalation: a new contact forces approval even at Autonomous level.
    let escalated = engine
        .create_action(
            ActionRequest::new("log_interaction")
                .with_parameter("contact_id", json!("c-2002"))
                .with_parameter("summary", json!("Cold outreach"))
                .with_contact("c-2002", true),
        )
        .await?;
    println!(
        "  new-contact variant: requires_approval={} status={}",
        escalated.requires_approval, escalated.status
    );

    print_metrics(&engine, "log_interaction");
    report_chain(&audit);
    Ok(())
}
