//! Registry configuration.

use chrono::TimeDelta;

/// Tunables shared by every principal of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// How long a principal lives after its last request. A TTL that
    /// reaches past the representable date range never expires.
    pub principal_ttl: TimeDelta,
    /// Display name of sessions created without one.
    pub default_session_name: String,
    /// Log file handed to engines created without one.
    pub default_log_file: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            principal_ttl: TimeDelta::minutes(60),
            default_session_name: "unnamed".to_string(),
            default_log_file: "restshop.log".to_string(),
        }
    }
}
