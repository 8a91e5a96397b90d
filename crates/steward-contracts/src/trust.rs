//! Trust levels, trust decisions, and the ledger configuration.
//!
//! Trust is tracked per (employee, action type). The level advances through
//! an ordered sequence as outcomes accumulate and may regress one level on
//! sustained rejection. The ledger in `steward-trust` owns the logic; this
//! module only defines the data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Sensitivity;

/// The ordered trust-level sequence for one action type.
///
/// `requires_approval → low_confidence → high_confidence → autonomous`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    RequiresApproval,
    LowConfidence,
    HighConfidence,
    Autonomous,
}

impl TrustLevel {
    /// The next level up, or `None` at `Autonomous`.
    pub fn next(&self) -> Option<TrustLevel> {
        match self {
            Self::RequiresApproval => Some(Self::LowConfidence),
            Self::LowConfidence => Some(Self::HighConfidence),
            Self::HighConfidence => Some(Self::Autonomous),
            Self::Autonomous => None,
        }
    }

    /// The next level down, or `None` at `RequiresApproval`.
    pub fn previous(&self) -> Option<TrustLevel> {
        match self {
            Self::RequiresApproval => None,
            Self::LowConfidence => Some(Self::RequiresApproval),
            Self::HighConfidence => Some(Self::LowConfidence),
            Self::Autonomous => Some(Self::HighConfidence),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresApproval => "requires_approval",
            Self::LowConfidence => "low_confidence",
            Self::HighConfidence => "high_confidence",
            Self::Autonomous => "autonomous",
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions an escalation rule can match on.
///
/// The first matching rule, in configured order, forces approval regardless
/// of trust level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationCondition {
    /// Confidence score below 0.3.
    LowConfidence,
    /// Risk tier is high or critical.
    HighRisk,
    /// The action concerns a contact the employee has never dealt with.
    UnknownContact,
    /// Declared content sensitivity is high.
    SensitiveTopic,
}

/// One escalation rule: condition → force human approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRule {
    pub condition: EscalationCondition,
    /// Explanation written into the decision reason and audit log.
    pub description: String,
}

impl EscalationRule {
    pub fn new(condition: EscalationCondition, description: impl Into<String>) -> Self {
        Self {
            condition,
            description: description.into(),
        }
    }
}

/// Ledger configuration, supplied at construction and updatable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Trust level for action types with no override and no learned metrics.
    pub default_level: TrustLevel,
    /// Explicit per-action-type level overrides.
    #[serde(default)]
    pub overrides: HashMap<String, TrustLevel>,
    /// Minimum confidence for auto-approval at `low_confidence` level.
    pub auto_approve_threshold: f64,
    /// Escalation rules, evaluated in order; first match wins.
    #[serde(default)]
    pub escalation_rules: Vec<EscalationRule>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            default_level: TrustLevel::RequiresApproval,
            overrides: HashMap::new(),
            auto_approve_threshold: 0.8,
            escalation_rules: vec![
                EscalationRule::new(
                    EscalationCondition::LowConfidence,
                    "confidence below the low-confidence floor",
                ),
                EscalationRule::new(
                    EscalationCondition::HighRisk,
                    "high or critical risk tier",
                ),
                EscalationRule::new(
                    EscalationCondition::UnknownContact,
                    "first interaction with this contact",
                ),
                EscalationRule::new(
                    EscalationCondition::SensitiveTopic,
                    "high content sensitivity",
                ),
            ],
        }
    }
}

/// Everything the ledger needs to evaluate one proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub action_type: String,
    pub contact_id: Option<String>,
    pub is_new_contact: bool,
    pub sensitivity: Sensitivity,
}

/// The ledger's verdict for one proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustDecision {
    /// True when a human must approve before execution.
    pub requires_approval: bool,
    /// Confidence score, clamped to [0, 1].
    pub confidence: f64,
    /// The trust level the decision was made under.
    pub level: TrustLevel,
    /// Human-readable explanation, written to the audit log.
    pub reason: String,
}

/// Cumulative outcome counters for one action type, lazily created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMetrics {
    pub total_actions: u64,
    pub approved_count: u64,
    pub rejected_count: u64,
    pub auto_approved_count: u64,
    /// Running average of decision confidence across all outcomes.
    pub avg_confidence: f64,
    /// Current learned trust level for this action type.
    pub level: TrustLevel,
}

impl TrustMetrics {
    pub fn new(level: TrustLevel) -> Self {
        Self {
            total_actions: 0,
            approved_count: 0,
            rejected_count: 0,
            auto_approved_count: 0,
            avg_confidence: 0.0,
            level,
        }
    }

    /// Approved share of all recorded outcomes; 0.0 before any outcome.
    pub fn approval_rate(&self) -> f64 {
        if self.total_actions == 0 {
            0.0
        } else {
            self.approved_count as f64 / self.total_actions as f64
        }
    }
}

/// One resolved outcome, fed back to the ledger by the lifecycle controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// True for approvals (manual or auto), false for rejections.
    pub approved: bool,
    /// True only when the action executed without a human in the loop.
    pub auto_approved: bool,
    /// The decision confidence the action was created with.
    pub confidence: f64,
}

impl ActionOutcome {
    pub fn approved(confidence: f64) -> Self {
        Self {
            approved: true,
            auto_approved: false,
            confidence,
        }
    }

    pub fn rejected(confidence: f64) -> Self {
        Self {
            approved: false,
            auto_approved: false,
            confidence,
        }
    }

    pub fn auto_approved(confidence: f64) -> Self {
        Self {
            approved: true,
            auto_approved: true,
            confidence,
        }
    }
}
