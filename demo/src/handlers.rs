//! Mock action handlers for the demo scenarios.
//!
//! Each handler stands in for a real integration (messaging hub, task
//! tracker, CRM) and prints what it would have done instead of doing it.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use steward_contracts::action::EmployeeAction;
use steward_contracts::error::{StewardError, StewardResult};
use steward_core::traits::ActionHandler;

/// Pretends to send a message through a communication channel.
pub struct MessageHandler;

#[async_trait]
impl ActionHandler for MessageHandler {
    async fn execute(&self, action: &EmployeeAction) -> StewardResult<Value> {
        let recipient = action.parameters["recipient"].as_str().unwrap_or("?");
        let channel = action.parameters["channel"].as_str().unwrap_or("?");
        println!("    [message] sent via {} to {}", channel, recipient);
        Ok(json!({ "message_id": "msg-001", "delivered": true }))
    }

    fn validate(&self, parameters: &Map<String, Value>) -> Vec<String> {
        match parameters.get("message").and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => Vec::new(),
            _ => vec!["message must be a non-empty string".to_string()],
        }
    }
}

/// Pretends to create a task in a task tracker.  Supports rollback by
/// "deleting" the created task.
pub struct TaskHandler;

#[async_trait]
impl ActionHandler for TaskHandler {
    async fn execute(&self, action: &EmployeeAction) -> StewardResult<Value> {
        let title = action.parameters["title"].as_str().unwrap_or("?");
        println!("    [tasks] created task: {}", title);
        Ok(json!({ "task_id": "task-001" }))
    }

    fn supports_rollback(&self) -> bool {
        true
    }

    async fn rollback(&self, action: &EmployeeAction) -> StewardResult<()> {
        let task_id = action
            .result
            .as_ref()
            .and_then(|r| r["task_id"].as_str())
            .unwrap_or("?");
        println!("    [tasks] deleted task {} (rollback)", task_id);
        Ok(())
    }
}

/// Pretends to write an interaction note into the CRM.
pub struct LogHandler;

#[async_trait]
impl ActionHandler for LogHandler {
    async fn execute(&self, action: &EmployeeAction) -> StewardResult<Value> {
        let contact = action.parameters["contact_id"].as_str().unwrap_or("?");
        println!("    [crm] logged interaction for contact {}", contact);
        Ok(json!({ "note_id": "note-001" }))
    }
}

/// Fails until the configured attempt, then succeeds.  Used to demonstrate
/// linear-backoff retries.
pub struct FlakyHandler {
    attempts: AtomicU32,
    succeed_on: u32,
}

impl FlakyHandler {
    pub fn new(succeed_on: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            succeed_on,
        }
    }
}

#[async_trait]
impl ActionHandler for FlakyHandler {
    async fn execute(&self, _action: &EmployeeAction) -> StewardResult<Value> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < self.succeed_on {
            println!("    [flaky] attempt {} failed (simulated 500)", attempt);
            return Err(StewardError::HandlerExecution {
                reason: format!("upstream returned 500 on attempt {}", attempt),
            });
        }
        println!("    [flaky] attempt {} succeeded", attempt);
        Ok(json!({ "attempt": attempt }))
    }
}
