//! The trust ledger: per-action-type metrics and the learning loop.
//!
//! `evaluate()` is the gate every proposed action passes through before the
//! lifecycle controller will queue it. `record_outcome()` closes the feedback
//! loop — approvals and rejections move the learned trust level through the
//! ordered sequence, which changes what future evaluations decide.
//!
//! Both methods are deterministic: the same inputs against the same metrics
//! always produce the same decision.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use steward_contracts::catalog::{ActionDefinition, RiskTier, Sensitivity};
use steward_contracts::trust::{
    ActionOutcome, EscalationCondition, EvaluationContext, TrustConfig, TrustDecision,
    TrustLevel, TrustMetrics,
};

use crate::classifier::{score_confidence, ClassifierInput};

/// Confidence floor below which the `low_confidence` escalation rule fires.
const LOW_CONFIDENCE_FLOOR: f64 = 0.3;

/// Confidence floor for auto-approval at the `high_confidence` trust level.
const HIGH_CONFIDENCE_FLOOR: f64 = 0.7;

/// Demotion trigger: more than this many rejections…
const DEMOTION_REJECTED_MIN: u64 = 5;

/// …combined with an approval rate below this.
const DEMOTION_RATE_CEILING: f64 = 0.6;

/// The (minimum sample size, minimum approval rate) gate that must be met
/// before the learned level may advance *into* `level`.
fn advancement_gate(level: TrustLevel) -> (u64, f64) {
    match level {
        // Never a target of advancement; the floor of the sequence.
        TrustLevel::RequiresApproval => (0, 0.0),
        TrustLevel::LowConfidence => (10, 0.80),
        TrustLevel::HighConfidence => (25, 0.85),
        TrustLevel::Autonomous => (50, 0.90),
    }
}

/// Per-employee trust state: configuration plus learned per-type metrics.
///
/// One ledger per (employee, workspace) pair, owned by that employee's
/// lifecycle controller. Durable storage of the metrics map is the
/// persistence collaborator's concern — `snapshot()` / `restore()` are the
/// seam it loads and saves through.
#[derive(Debug)]
pub struct TrustLedger {
    config: TrustConfig,
    metrics: HashMap<String, TrustMetrics>,
}

impl TrustLedger {
    pub fn new(config: TrustConfig) -> Self {
        Self {
            config,
            metrics: HashMap::new(),
        }
    }

    /// A ledger with the default configuration (everything starts at
    /// `requires_approval`, threshold 0.8, all four escalation rules).
    pub fn with_defaults() -> Self {
        Self::new(TrustConfig::default())
    }

    /// Decide whether the described action may run without human approval.
    ///
    /// Steps, in order:
    /// 1. Resolve the trust level: per-type override → learned level →
    ///    configured default.
    /// 2. Score confidence via the classifier.
    /// 3. Evaluate escalation rules in configured order; the first match
    ///    forces approval and short-circuits.
    /// 4. Otherwise apply the trust-level policy.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext,
        definition: &ActionDefinition,
    ) -> TrustDecision {
        let metrics = self.metrics.get(&ctx.action_type);

        let level = self
            .config
            .overrides
            .get(&ctx.action_type)
            .copied()
            .or_else(|| metrics.map(|m| m.level))
            .unwrap_or(self.config.default_level);

        let confidence = score_confidence(&ClassifierInput {
            risk: definition.risk,
            sensitivity: ctx.sensitivity,
            is_new_contact: ctx.is_new_contact,
            approval_rate: metrics
                .filter(|m| m.total_actions > 0)
                .map(|m| m.approval_rate()),
            prior_actions: metrics.map(|m| m.total_actions).unwrap_or(0),
        });

        debug!(
            action_type = %ctx.action_type,
            level = %level,
            confidence,
            risk = %definition.risk,
            "evaluating trust"
        );

        // Escalation rules override trust level; first match wins.
        for rule in &self.config.escalation_rules {
            let fired = match rule.condition {
                EscalationCondition::LowConfidence => confidence < LOW_CONFIDENCE_FLOOR,
                EscalationCondition::HighRisk => {
                    matches!(definition.risk, RiskTier::High | RiskTier::Critical)
                }
                EscalationCondition::UnknownContact => ctx.is_new_contact,
                EscalationCondition::SensitiveTopic => ctx.sensitivity == Sensitivity::High,
            };
            if fired {
                info!(
                    action_type = %ctx.action_type,
                    condition = ?rule.condition,
                    "escalation rule fired, approval required"
                );
                return TrustDecision {
                    requires_approval: true,
                    confidence,
                    level,
                    reason: format!("escalation: {}", rule.description),
                };
            }
        }

        let (requires_approval, reason) = match level {
            TrustLevel::RequiresApproval => (
                true,
                format!("trust level '{level}' always requires approval"),
            ),
            TrustLevel::LowConfidence => {
                let auto = confidence >= self.config.auto_approve_threshold
                    && !matches!(definition.risk, RiskTier::High | RiskTier::Critical);
                if auto {
                    (
                        false,
                        format!(
                            "confidence {confidence:.2} meets threshold {:.2} at trust level '{level}'",
                            self.config.auto_approve_threshold
                        ),
                    )
                } else {
                    (
                        true,
                        format!(
                            "confidence {confidence:.2} below threshold {:.2} at trust level '{level}'",
                            self.config.auto_approve_threshold
                        ),
                    )
                }
            }
            TrustLevel::HighConfidence => {
                let needs = definition.risk == RiskTier::Critical
                    || confidence < HIGH_CONFIDENCE_FLOOR;
                if needs {
                    (
                        true,
                        format!(
                            "trust level '{level}' requires approval for critical risk or confidence below {HIGH_CONFIDENCE_FLOOR:.2} (got {confidence:.2})"
                        ),
                    )
                } else {
                    (
                        false,
                        format!("confidence {confidence:.2} at trust level '{level}'"),
                    )
                }
            }
            TrustLevel::Autonomous => {
                if definition.risk == RiskTier::Critical {
                    (
                        true,
                        format!("critical risk overrides trust level '{level}'"),
                    )
                } else {
                    (false, format!("trust level '{level}' runs autonomously"))
                }
            }
        };

        TrustDecision {
            requires_approval,
            confidence,
            level,
            reason,
        }
    }

    /// Record one resolved outcome and re-evaluate the learned trust level.
    ///
    /// Advancement requires the next level's gate (minimum sample size AND
    /// minimum approval rate). Demotion drops exactly one level when the
    /// rejected count exceeds 5 and the approval rate has fallen below 0.6.
    pub fn record_outcome(&mut self, action_type: &str, outcome: ActionOutcome) {
        let default_level = self.config.default_level;
        let metrics = self
            .metrics
            .entry(action_type.to_string())
            .or_insert_with(|| TrustMetrics::new(default_level));

        metrics.total_actions += 1;
        if outcome.approved {
            metrics.approved_count += 1;
        } else {
            metrics.rejected_count += 1;
        }
        if outcome.auto_approved {
            metrics.auto_approved_count += 1;
        }
        metrics.avg_confidence +=
            (outcome.confidence - metrics.avg_confidence) / metrics.total_actions as f64;

        if let Some(next) = metrics.level.next() {
            let (min_actions, min_rate) = advancement_gate(next);
            if metrics.total_actions >= min_actions && metrics.approval_rate() >= min_rate {
                info!(
                    action_type,
                    from = %metrics.level,
                    to = %next,
                    total = metrics.total_actions,
                    rate = metrics.approval_rate(),
                    "trust level advanced"
                );
                metrics.level = next;
                return;
            }
        }

        if metrics.rejected_count > DEMOTION_REJECTED_MIN
            && metrics.approval_rate() < DEMOTION_RATE_CEILING
        {
            if let Some(previous) = metrics.level.previous() {
                warn!(
                    action_type,
                    from = %metrics.level,
                    to = %previous,
                    rejected = metrics.rejected_count,
                    rate = metrics.approval_rate(),
                    "trust level demoted"
                );
                metrics.level = previous;
            }
        }
    }

    /// Replace the ledger configuration at runtime.
    ///
    /// Learned metrics are untouched; only defaults, overrides, threshold,
    /// and escalation rules change.
    pub fn update_config(&mut self, config: TrustConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Metrics for one action type, if any outcome has been recorded.
    pub fn metrics(&self, action_type: &str) -> Option<&TrustMetrics> {
        self.metrics.get(action_type)
    }

    /// Clone of the full metrics map, for the persistence collaborator.
    pub fn snapshot(&self) -> HashMap<String, TrustMetrics> {
        self.metrics.clone()
    }

    /// Replace the metrics map, e.g. when loading durable state at startup.
    pub fn restore(&mut self, snapshot: HashMap<String, TrustMetrics>) {
        self.metrics = snapshot;
    }
}
