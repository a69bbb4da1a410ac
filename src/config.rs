//! Engine configuration

use crate::error::SyncResult;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Settings for a [`Prism`](crate::prism::Prism)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrismConfig {
    /// Minimum interval between translation rounds, in milliseconds
    pub throttle_ms: u64,
    /// Flag a machine update even when it replaces a whole node's content
    pub annotate_sole_update: bool,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 50,
            annotate_sole_update: false,
        }
    }
}

impl PrismConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Load from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrismConfig::default();
        assert_eq!(config.throttle(), Duration::from_millis(50));
        assert!(!config.annotate_sole_update);
    }

    #[test]
    fn test_partial_json() {
        let config: PrismConfig = serde_json::from_str(r#"{ "throttleMs": 200 }"#).unwrap();
        assert_eq!(config.throttle_ms, 200);
        assert!(!config.annotate_sole_update);
    }

    #[test]
    fn test_missing_file() {
        assert!(PrismConfig::from_json_file("/nonexistent/prism.json").is_err());
    }
}
