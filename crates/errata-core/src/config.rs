use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::KeyStrategy;

/// Occurrences retained per group when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Upper bound on frames kept from a captured stack.
pub const DEFAULT_MAX_STACK_FRAMES: usize = 64;

/// Collector configuration.
///
/// Deserializes from JSON with every field optional, e.g.
/// `{"capacity": 20, "key_strategy": "stack_head"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum occurrences kept per group; older ones are evicted first.
    pub capacity: usize,
    /// Maximum frames per stacktrace. 0 disables capture.
    pub max_stack_frames: usize,
    pub key_strategy: KeyStrategy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_stack_frames: DEFAULT_MAX_STACK_FRAMES,
            key_strategy: KeyStrategy::default(),
        }
    }
}

impl CollectorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
