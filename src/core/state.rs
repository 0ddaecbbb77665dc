//! Hook and lifecycle state types

use serde::{Deserialize, Serialize};

/// The three lifecycle events relayed from a host to its hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Hook attached to a live host
    Mount,
    /// Host observed a state change
    Update,
    /// Host is being permanently destroyed
    Unmount,
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::Mount => write!(f, "mount"),
            LifecycleEvent::Update => write!(f, "update"),
            LifecycleEvent::Unmount => write!(f, "unmount"),
        }
    }
}

/// Current state of a hook instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HookState {
    /// Not part of any registry; no dispatch reaches it
    #[default]
    Detached,

    /// Attached to exactly one host and receiving its lifecycle events
    Mounted,
}

impl HookState {
    /// Check if the hook is receiving lifecycle events
    pub fn is_mounted(&self) -> bool {
        matches!(self, HookState::Mounted)
    }
}

impl std::fmt::Display for HookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookState::Detached => write!(f, "Detached"),
            HookState::Mounted => write!(f, "Mounted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_checks() {
        assert!(HookState::Mounted.is_mounted());
        assert!(!HookState::Detached.is_mounted());
        assert_eq!(HookState::default(), HookState::Detached);
    }

    #[test]
    fn test_display() {
        assert_eq!(LifecycleEvent::Update.to_string(), "update");
        assert_eq!(HookState::Mounted.to_string(), "Mounted");
    }
}
