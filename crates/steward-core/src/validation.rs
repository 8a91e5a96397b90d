//! Parameter validation against an `ActionDefinition`.
//!
//! Validation runs in two phases:
//!
//! 1. **Presence** — every required parameter must be present and non-null.
//! 2. **Structural** — when the definition declares a `params_schema`, the
//!    whole parameter bag is validated against it with the `jsonschema`
//!    crate.
//!
//! All failures are collected before returning so callers see the full
//! failure set in one pass.

use serde_json::{Map, Value};
use tracing::warn;

use steward_contracts::catalog::ActionDefinition;
use steward_contracts::error::{StewardError, StewardResult};

/// Validate `parameters` against `definition`.
///
/// Returns `StewardError::Validation` with every collected problem joined
/// by "; " — no state may be created for a request that fails here.
pub fn validate_parameters(
    definition: &ActionDefinition,
    parameters: &Map<String, Value>,
) -> StewardResult<()> {
    let mut errors: Vec<String> = Vec::new();

    for name in &definition.required_params {
        match parameters.get(name) {
            Some(value) if !value.is_null() => {}
            _ => errors.push(format!("missing required parameter '{}'", name)),
        }
    }

    if let Some(schema) = &definition.params_schema {
        match jsonschema::validator_for(schema) {
            Ok(validator) => {
                let payload = Value::Object(parameters.clone());
                for error in validator.iter_errors(&payload) {
                    errors.push(format!(
                        "schema violation at {}: {}",
                        error.instance_path, error
                    ));
                }
            }
            Err(e) => {
                // A malformed schema is a catalog defect; surface it as a
                // validation failure rather than letting the action through.
                warn!(action_type = %definition.name, error = %e, "malformed parameter schema");
                errors.push(format!(
                    "invalid parameter schema for '{}': {}",
                    definition.name, e
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StewardError::Validation {
            reason: errors.join("; "),
        })
    }
}
