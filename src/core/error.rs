//! Lifecycle error types

use thiserror::Error;

use super::state::LifecycleEvent;

/// Errors that can occur while attaching hooks or dispatching lifecycle events
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A hook was built without a properties producer
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The hook is already mounted on a host
    #[error("Hook already attached: {hook}")]
    AlreadyAttached {
        /// Name of the offending hook
        hook: String,
    },

    /// The host has already delivered its unmount notification
    #[error("Host already unmounted")]
    HostUnmounted,

    /// A hook reaction returned an error
    #[error("Hook '{hook}' failed during {event}: {source}")]
    Reaction {
        /// Name of the failing hook
        hook: String,
        /// Lifecycle event being dispatched
        event: LifecycleEvent,
        /// Error returned by the reaction
        #[source]
        source: anyhow::Error,
    },

    /// Too many lifecycle events were queued from inside a dispatch cycle
    #[error("Re-entrant lifecycle queue exceeded {limit} events")]
    ReentrancyLimit {
        /// Configured queue bound
        limit: usize,
    },

    /// Invalid manager configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LifecycleError {
    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        LifecycleError::InvalidArgument(msg.into())
    }

    /// Wrap an error returned by a hook reaction
    pub fn reaction(hook: impl Into<String>, event: LifecycleEvent, source: anyhow::Error) -> Self {
        LifecycleError::Reaction {
            hook: hook.into(),
            event,
            source,
        }
    }
}

/// Result type alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
