//! Configuration for batch processing
//!
//! Bounds how many reports are structured at once and how large a batch may be.

use serde::{Deserialize, Serialize};

/// Configuration for the lifecycle manager and dispatcher
///
/// # Examples
///
/// ```
/// use radstruct_lifecycle::LifecycleConfig;
///
/// let config = LifecycleConfig::default();
/// assert_eq!(config.max_concurrency, 4);
///
/// // One call at a time (local models)
/// let config = LifecycleConfig::from_toml("max_concurrency = 1").unwrap();
/// assert_eq!(config.max_batch_size, 1_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Reports processed concurrently by the dispatcher
    pub max_concurrency: usize,

    /// Largest accepted batch
    pub max_batch_size: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_batch_size: 1_000,
        }
    }
}

impl LifecycleConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
