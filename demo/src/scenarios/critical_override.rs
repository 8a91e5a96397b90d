//! Scenario 4: Critical risk overrides trust.
//!
//! The `custom` action type carries the Critical risk tier.  Even with an
//! Autonomous trust override, the trust gate keeps it in the pending queue,
//! where a human rejects it.

use steward_contracts::action::ActionRequest;
use steward_contracts::error::StewardResult;
use steward_contracts::trust::{TrustConfig, TrustLevel};
use steward_core::EngineConfig;

use crate::scenarios::{build_engine, print_audit_trail, print_metrics, report_chain};

pub async fn run_scenario() -> StewardResult<()> {
    println!("Scenario 4: critical risk overrides autonomous trust");

    let mut trust = TrustConfig::default();
    trust
        .overrides
        .insert("custom".to_string(), TrustLevel::Autonomous);

    let (engine, audit) = build_engine(EngineConfig::default(), trust);

    let action = engine.create_action(ActionRequest::new("custom")).await?;
    println!(
        "  proposed critical action: requires_approval={} status={}",
        action.requires_approval, action.status
    );

    let rejected = engine.reject_action(action.id, "demo-manager", "not reviewed")?;
    println!(
        "  rejected: status={} reason={}",
        rejected.status,
        rejected.rejection_reason.as_deref().unwrap_or("-")
    );

    print_audit_trail(&engine, action.id);
    print_metrics(&engine, "custom");
    report_chain(&audit);
    Ok(())
}
