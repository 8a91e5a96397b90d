//! Scenario 3: Retry flow.
//!
//! A handler that fails twice before succeeding demonstrates linear-backoff
//! retries: the first retry waits one base delay, the second waits two.

use std::sync::Arc;

use serde_json::json;

use steward_contracts::action::{ActionRequest, ActionStatus};
use steward_contracts::audit::{AuditEventKind, AuditQuery};
use steward_contracts::error::StewardResult;
use steward_contracts::trust::TrustConfig;
use steward_core::EngineConfig;

use crate::handlers::FlakyHandler;
use crate::scenarios::{build_engine, report_chain, wait_until};

pub async fn run_scenario() -> StewardResult<()> {
    println!("Scenario 3: retry flow (linear backoff)");

    let config = EngineConfig {
        retry_delay_ms: 200,
        ..EngineConfig::default()
    };
    let (engine, audit) = build_engine(config, TrustConfig::default());
    engine.register_handler("create_task", Arc::new(FlakyHandler::new(3)));

    let action = engine
        .create_action(
            ActionRequest::new("create_task")
                .with_parameter("title", json!("Sync CRM records")),
        )
        .await?;
    engine.approve_action(action.id, "demo-manager").await?;

    wait_until(&engine, action.id, ActionStatus::Completed).await;

    let final_state = engine.get_action(action.id).expect("action exists");
    println!(
        "  final: status={} retry_count={}",
        final_state.status, final_state.retry_count
    );
    for entry in engine.audit_log(
        &AuditQuery::for_action(action.id).with_event(AuditEventKind::RetryScheduled),
    ) {
        let delay = entry
            .detail
            .as_ref()
            .and_then(|d| d["delay_ms"].as_u64())
            .unwrap_or(0);
        println!("  retry scheduled with delay {} ms", delay);
    }

    report_chain(&audit);
    Ok(())
}
