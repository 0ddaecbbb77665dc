//! Hooks Module
//!
//! Attach reusable behavior to a long-lived host and have it follow the
//! host's mount/update/unmount lifecycle.
//!
//! # Overview
//!
//! A hook is:
//! - a properties producer, re-run on mount and on every host update,
//! - the last properties snapshot it produced,
//! - three reactions (`on_mount`, `on_update`, `on_unmount`), all optional.
//!
//! # Example
//!
//! ```ignore
//! use lifecycle_hooks::hooks::{FnReactions, Hook};
//! use lifecycle_hooks::runtime::{attach, detach};
//!
//! let counter = Rc::new(Counter::new(1));
//!
//! let source = counter.clone();
//! let logger = Rc::new(Hook::new(
//!     move || source.value(),
//!     FnReactions::new().with_update(|value: &u32, previous: &u32| {
//!         tracing::info!("counter {} -> {}", previous, value);
//!         Ok(())
//!     }),
//! ));
//!
//! attach(&counter, &logger)?;
//! counter.increment()?;   // logs "counter 1 -> 2"
//! detach(&counter, &logger)?;
//! ```
//!
//! # Lifecycle
//!
//! | Transition | Trigger | Producer | Reaction |
//! |------------|---------|----------|----------|
//! | Detached → Mounted | `attach` | once | `on_mount(props)` |
//! | Mounted → Mounted | host update | once | `on_update(props, previous)` |
//! | Mounted → Detached | `detach` or host unmount | never | `on_unmount(props)` |

mod hook;
mod registry;

pub use hook::{FnReactions, Hook, HookBuilder, Reactions};
pub use registry::HostRegistry;

pub(crate) use registry::HookRef;
