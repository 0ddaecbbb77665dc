//! Hook Manager Configuration

use serde::{Deserialize, Serialize};

use super::error::{LifecycleError, LifecycleResult};

/// What to do when a hook that is already mounted gets attached again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the attach with `LifecycleError::AlreadyAttached`
    #[default]
    Reject,
    /// Log a warning and leave the registry untouched
    Ignore,
}

/// Configuration for a `HookManager`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Policy for attaching an already-mounted hook
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Maximum number of lifecycle events that may be queued on one host
    /// while a dispatch cycle is running
    #[serde(default = "default_max_queued_events")]
    pub max_queued_events: usize,
}

fn default_max_queued_events() -> usize {
    64
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            max_queued_events: default_max_queued_events(),
        }
    }
}

impl ManagerConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate attach policy
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the re-entrant event queue bound
    pub fn with_max_queued_events(mut self, max: usize) -> Self {
        self.max_queued_events = max;
        self
    }

    /// Parse and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> LifecycleResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable
    pub fn validate(&self) -> LifecycleResult<()> {
        if self.max_queued_events == 0 {
            return Err(LifecycleError::InvalidConfig(
                "max_queued_events must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
