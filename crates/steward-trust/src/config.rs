//! TOML loading for `TrustConfig`.
//!
//! Employee records carry their trust configuration as TOML. Example:
//!
//! ```toml
//! default_level = "requires_approval"
//! auto_approve_threshold = 0.8
//!
//! [overrides]
//! log_interaction = "autonomous"
//!
//! [[escalation_rules]]
//! condition = "high_risk"
//! description = "high or critical risk tier"
//! ```

use std::path::Path;

use steward_contracts::error::{StewardError, StewardResult};
use steward_contracts::trust::TrustConfig;

/// Parse `s` as a TOML trust configuration.
///
/// Returns `StewardError::Config` if the TOML is malformed or does not match
/// the `TrustConfig` schema.
pub fn from_toml_str(s: &str) -> StewardResult<TrustConfig> {
    toml::from_str(s).map_err(|e| StewardError::Config {
        reason: format!("failed to parse trust config TOML: {}", e),
    })
}

/// Read the file at `path` and parse it as TOML trust configuration.
pub fn from_file(path: &Path) -> StewardResult<TrustConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| StewardError::Config {
        reason: format!("failed to read trust config '{}': {}", path.display(), e),
    })?;
    from_toml_str(&contents)
}
