//! The static action-type catalog.
//!
//! Every action type an employee may propose has one `ActionDefinition`
//! describing its risk tier, reversibility, and parameter surface. The
//! catalog is loaded once at startup and shared process-wide; the lifecycle
//! controller rejects any request whose type is not in it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Inherent risk of an action type, fixed in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Declared sensitivity of an action's content, supplied per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

/// Static description of one action type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Catalog key, e.g. "send_message".
    pub name: String,
    /// Inherent risk tier; feeds the confidence score and escalation rules.
    pub risk: RiskTier,
    /// True if a completed action of this type can be rolled back.
    pub reversible: bool,
    /// Parameter names that must be present and non-null.
    pub required_params: Vec<String>,
    /// Parameter names the type understands but does not require.
    pub optional_params: Vec<String>,
    /// Optional JSON Schema applied to the whole parameter bag.
    pub params_schema: Option<Value>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, risk: RiskTier, reversible: bool) -> Self {
        Self {
            name: name.into(),
            risk,
            reversible,
            required_params: Vec::new(),
            optional_params: Vec::new(),
            params_schema: None,
        }
    }

    pub fn with_required(mut self, params: &[&str]) -> Self {
        self.required_params = params.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_optional(mut self, params: &[&str]) -> Self {
        self.optional_params = params.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.params_schema = Some(schema);
        self
    }
}

/// The process-wide action-type catalog.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    definitions: HashMap<String, ActionDefinition>,
}

impl ActionCatalog {
    /// An empty catalog. Hosting applications that define their own action
    /// vocabulary start here and `insert` their definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog of employee action types.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            ActionDefinition::new("send_message", RiskTier::Medium, false)
                .with_required(&["channel", "recipient", "message"])
                .with_optional(&["subject"])
                .with_schema(json!({
                    "type": "object",
                    "properties": {
                        "channel": { "type": "string" },
                        "recipient": { "type": "string" },
                        "message": { "type": "string", "minLength": 1 },
                        "subject": { "type": "string" }
                    }
                })),
        );
        catalog.insert(
            ActionDefinition::new("create_task", RiskTier::Low, true)
                .with_required(&["title"])
                .with_optional(&["description", "due_date", "assignee"]),
        );
        catalog.insert(
            ActionDefinition::new("schedule_followup", RiskTier::Low, true)
                .with_required(&["contact_id", "followup_at"])
                .with_optional(&["note"]),
        );
        catalog.insert(
            ActionDefinition::new("update_contact", RiskTier::Medium, true)
                .with_required(&["contact_id", "fields"]),
        );
        catalog.insert(
            ActionDefinition::new("log_interaction", RiskTier::Low, true)
                .with_required(&["contact_id", "summary"])
                .with_optional(&["channel"]),
        );
        catalog.insert(
            ActionDefinition::new("escalate_to_human", RiskTier::Low, false)
                .with_required(&["reason"])
                .with_optional(&["urgency", "context"]),
        );
        // Open extension point: arbitrary payloads, but always critical risk.
        catalog.insert(ActionDefinition::new("custom", RiskTier::Critical, false));

        catalog
    }

    pub fn insert(&mut self, definition: ActionDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, action_type: &str) -> Option<&ActionDefinition> {
        self.definitions.get(action_type)
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.definitions.contains_key(action_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterate over all definitions in unspecified order.
    pub fn all(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.definitions.values()
    }
}
