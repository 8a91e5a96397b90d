//! The risk/confidence classifier: a pure scoring function.
//!
//! Maps an action's risk tier, declared sensitivity, contact familiarity,
//! and historical approval rate to a confidence estimate in [0, 1]. The
//! classifier holds no state — history arrives as plain numbers from the
//! ledger's metrics.

use steward_contracts::catalog::{RiskTier, Sensitivity};

/// Everything the classifier scores on.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput {
    /// Inherent risk tier from the action's catalog definition.
    pub risk: RiskTier,
    /// Declared content sensitivity from the request.
    pub sensitivity: Sensitivity,
    /// True when the employee has never dealt with this contact.
    pub is_new_contact: bool,
    /// Historical approval rate for this action type, `None` before any
    /// outcome has been recorded.
    pub approval_rate: Option<f64>,
    /// Count of prior actions of this type (approved or not).
    pub prior_actions: u64,
}

/// Maximum bonus granted for familiarity with an action type.
const FAMILIARITY_CAP: f64 = 0.2;

/// Bonus per prior action of the same type, up to `FAMILIARITY_CAP`.
const FAMILIARITY_STEP: f64 = 0.02;

/// Penalty applied when the contact is unknown to the employee.
const NEW_CONTACT_PENALTY: f64 = 0.15;

/// Compute a confidence score for one proposed action.
///
/// Starts at 0.5 and applies, in order:
/// - historical approval rate, scaled to ±0.3 around the 0.5 baseline;
/// - a familiarity bonus of 0.02 per prior action, capped at +0.2;
/// - a −0.15 penalty for a new contact;
/// - a sensitivity penalty (−0.1 medium, −0.2 high);
/// - a risk-tier adjustment (+0.1 low, −0.15 high, −0.3 critical).
///
/// The result is always clamped to [0, 1].
pub fn score_confidence(input: &ClassifierInput) -> f64 {
    let mut confidence = 0.5;

    if let Some(rate) = input.approval_rate {
        // rate 1.0 → +0.3, rate 0.0 → −0.3, rate 0.5 → no adjustment.
        confidence += (rate - 0.5) * 0.6;
    }

    confidence += (input.prior_actions as f64 * FAMILIARITY_STEP).min(FAMILIARITY_CAP);

    if input.is_new_contact {
        confidence -= NEW_CONTACT_PENALTY;
    }

    confidence += match input.sensitivity {
        Sensitivity::Low => 0.0,
        Sensitivity::Medium => -0.1,
        Sensitivity::High => -0.2,
    };

    confidence += match input.risk {
        RiskTier::Low => 0.1,
        RiskTier::Medium => 0.0,
        RiskTier::High => -0.15,
        RiskTier::Critical => -0.3,
    };

    confidence.clamp(0.0, 1.0)
}
