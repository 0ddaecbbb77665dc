//! Core types for the hook framework
//!
//! This module provides the fundamental types used throughout the crate:
//! - `LifecycleEvent` / `HookState` - Lifecycle and per-hook state
//! - `ManagerConfig` - Registry behavior knobs
//! - `LifecycleError` - Error types

pub mod config;
pub mod error;
pub mod state;

pub use config::{DuplicatePolicy, ManagerConfig};
pub use error::{LifecycleError, LifecycleResult};
pub use state::{HookState, LifecycleEvent};
