//! Host side of the hook runtime
//!
//! - `Host` - the listener-registration contract a host must expose
//! - `HostLifecycle` - a ready-made notifier hosts can embed

pub mod lifecycle;

pub use lifecycle::{Host, HostLifecycle, Listener, UnmountCompletion, UnmountListener};
