//! STEWARD Progressive Trust Engine — Demo CLI
//!
//! Runs one or all of the four demo scenarios.  Each scenario uses real
//! STEWARD components (trust ledger, action engine, hash-chained audit log)
//! wired together with mock action handlers.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- approval-flow
//!   cargo run -p demo -- autonomous-flow
//!   cargo run -p demo -- retry-flow
//!   cargo run -p demo -- critical-override

mod handlers;
mod scenarios;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use steward_contracts::error::StewardResult;

// ── CLI definition ────────────────────────────────────────────────────────────

/// STEWARD — Progressive trust and action execution demo.
///
/// Each subcommand runs one or all of the four scenarios, demonstrating the
/// trust gate, the action state machine, retries, and the audit chain.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "STEWARD progressive-trust engine demo",
    long_about = "Runs STEWARD demo scenarios showing trust gating, human approval,\n\
                  autonomous execution, linear-backoff retries, rollback, and\n\
                  audit chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: create → approve → execute → rollback.
    ApprovalFlow,
    /// Scenario 2: autonomous auto-approval plus new-contact escalation.
    AutonomousFlow,
    /// Scenario 3: failing handler retried with linear backoff.
    RetryFlow,
    /// Scenario 4: Critical risk tier overrides an Autonomous trust level.
    CriticalOverride,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::ApprovalFlow => scenarios::approval_flow::run_scenario().await,
        Command::AutonomousFlow => scenarios::autonomous_flow::run_scenario().await,
        Command::RetryFlow => scenarios::retry_flow::run_scenario().await,
        Command::CriticalOverride => scenarios::critical_override::run_scenario().await,
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_all() -> StewardResult<()> {
    scenarios::approval_flow::run_scenario().await?;
    scenarios::autonomous_flow::run_scenario().await?;
    scenarios::retry_flow::run_scenario().await?;
    scenarios::critical_override::run_scenario().await?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("STEWARD — Progressive Trust & Action Execution Engine");
    println!("======================================================");
    println!();
    println!("STEWARD pipeline per proposed action:");
    println!("  [1] Catalog + schema validation of the request parameters");
    println!("  [2] Trust ledger scores confidence and applies escalation rules");
    println!("  [3] Pending (human approval) or Approved (autonomous) queueing");
    println!("  [4] Handler executed ONLY for approved actions; linear-backoff retries");
    println!("  [5] Every lifecycle event written to a SHA-256 hash-chained audit log");
    println!();
}
