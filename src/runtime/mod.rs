//! Runtime for attaching hooks to hosts
//!
//! This module contains:
//! - `HookManager` - side table from host to registry, `attach`/`detach`
//! - the lifecycle interceptor that wires a registry into a host
//! - free `attach`/`detach` functions backed by a per-thread default manager

mod interceptor;
pub mod manager;

pub use manager::{attach, default_manager, detach, HookManager};
