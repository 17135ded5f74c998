//! Transaction configuration.

use std::time::Duration;

/// Path prefix every API resource lives under.
pub const DEFAULT_BASE_PATH: &str = "/deployr";

/// Client-side timeout applied to every transaction: 20 minutes, long
/// enough for slow R scripts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Settings shared by every transaction a manager dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Prefix joined in front of each descriptor's path.
    pub base_path: String,

    /// How long the transport may take before the transaction fails.
    pub timeout: Duration,

    /// Whether replies may be served from a cache. Off by default: API
    /// replies describe live server state.
    pub cache: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache: false,
        }
    }
}
