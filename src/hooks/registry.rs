//! Hook Registry
//!
//! Contains:
//! - `HostRegistry` - the ordered list of hooks attached to one host
//! - dispatch of update/unmount cycles over that list
//!
//! Dispatch order is attachment order. Each cycle walks a snapshot of the
//! list, so hooks attached during a cycle wait for the next one and hooks
//! detached during a cycle are skipped when reached. Events that arrive
//! while a cycle is running are queued and handled after it, never nested.
//! Once an unmount is queued, the running update cycle stops and no hook
//! sees another update.
//!
//! A hook leaving the registry runs `on_unmount` while it is still listed,
//! and is only removed once that reaction succeeds.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::hook::Dispatch;
use crate::core::{HookState, LifecycleError, LifecycleResult};
use crate::host::UnmountCompletion;

/// Type alias for stored hooks
pub(crate) type HookRef = Rc<dyn Dispatch>;

/// Reference identity of two stored hooks
pub(crate) fn same_hook(a: &HookRef, b: &HookRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Host notification waiting for the running cycle to finish
enum PendingEvent {
    Update,
    /// Carries the host's completion so its own handler runs afterwards
    Unmount(Rc<UnmountCompletion>),
}

impl std::fmt::Display for PendingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingEvent::Update => write!(f, "update"),
            PendingEvent::Unmount(_) => write!(f, "unmount"),
        }
    }
}

/// Ordered per-host list of attached hooks
pub struct HostRegistry {
    hooks: RefCell<Vec<HookRef>>,

    /// Set once the host's unmount cycle has started
    closed: Cell<bool>,

    dispatching: Cell<bool>,
    pending: RefCell<VecDeque<PendingEvent>>,
    max_queued: usize,

    /// Runs when the registry is discarded (removes it from the side table)
    on_close: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl HostRegistry {
    /// Create an empty registry
    pub(crate) fn new(max_queued: usize) -> Self {
        Self {
            hooks: RefCell::new(Vec::new()),
            closed: Cell::new(false),
            dispatching: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            max_queued,
            on_close: RefCell::new(None),
        }
    }

    pub(crate) fn set_on_close(&self, f: impl FnOnce() + 'static) {
        *self.on_close.borrow_mut() = Some(Box::new(f));
    }

    /// Number of attached hooks
    pub fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    /// Check if no hook is attached
    pub fn is_empty(&self) -> bool {
        self.hooks.borrow().is_empty()
    }

    /// Check if the host has unmounted and this registry was discarded
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Check if a dispatch cycle is currently running
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Names of the attached hooks, in dispatch order
    pub fn hook_names(&self) -> Vec<String> {
        self.hooks
            .borrow()
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    pub(crate) fn contains(&self, hook: &HookRef) -> bool {
        self.hooks.borrow().iter().any(|h| same_hook(h, hook))
    }

    fn unmount_queued(&self) -> bool {
        self.pending
            .borrow()
            .iter()
            .any(|e| matches!(e, PendingEvent::Unmount(_)))
    }

    fn remove(&self, hook: &HookRef) {
        self.hooks.borrow_mut().retain(|h| !same_hook(h, hook));
    }

    /// Append a hook, compute its properties and run its mount reaction
    pub(crate) fn attach(&self, hook: HookRef) -> LifecycleResult<()> {
        hook.set_state(HookState::Mounted);
        self.hooks.borrow_mut().push(hook.clone());

        tracing::debug!(
            "[HostRegistry] Attached hook '{}' ({} total)",
            hook.name(),
            self.len()
        );

        hook.mount()
    }

    /// Run a hook's unmount reaction, then remove it
    ///
    /// Returns `false` if the hook is not attached here or is already on
    /// its way out. While `on_unmount` runs the hook is still listed but
    /// marked `Detached`, so cycles skip it and a nested detach is a no-op.
    /// If the reaction fails the hook stays attached and `Mounted`.
    pub(crate) fn detach(&self, hook: &HookRef) -> LifecycleResult<bool> {
        if !self.contains(hook) || !hook.is_mounted() {
            return Ok(false);
        }

        hook.set_state(HookState::Detached);
        if let Err(e) = hook.unmount() {
            if self.contains(hook) {
                hook.set_state(HookState::Mounted);
            }
            return Err(e);
        }

        self.remove(hook);
        tracing::debug!(
            "[HostRegistry] Detached hook '{}' ({} remaining)",
            hook.name(),
            self.len()
        );
        Ok(true)
    }

    /// Drop every hook without running reactions
    ///
    /// Used when the host went away without unmounting. The hooks return to
    /// `Detached` so they can be attached elsewhere.
    pub(crate) fn release(&self) {
        self.closed.set(true);
        self.pending.borrow_mut().clear();

        tracing::debug!("[HostRegistry] Releasing {} hooks of a dropped host", self.len());
        self.release_remaining();
    }

    /// Relay a host update to every attached hook
    pub fn dispatch_update(&self) -> LifecycleResult<()> {
        self.dispatch(PendingEvent::Update)
    }

    /// Relay the host unmount to every attached hook and discard the registry
    ///
    /// `done` is completed once every hook has run its unmount reaction,
    /// possibly after this call returns if a cycle is already running.
    pub fn dispatch_unmount(&self, done: Rc<UnmountCompletion>) -> LifecycleResult<()> {
        self.dispatch(PendingEvent::Unmount(done))
    }

    fn dispatch(&self, event: PendingEvent) -> LifecycleResult<()> {
        if self.closed.get() {
            tracing::trace!("[HostRegistry] Ignoring {} on closed registry", event);
            if let PendingEvent::Unmount(done) = event {
                done.complete();
            }
            return Ok(());
        }

        if self.dispatching.get() {
            return self.enqueue(event);
        }

        let _guard = DispatchGuard::enter(self);
        self.run_cycle(event)?;

        let mut processed = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(next) = next else { break };

            processed += 1;
            if processed > self.max_queued {
                return Err(LifecycleError::ReentrancyLimit {
                    limit: self.max_queued,
                });
            }

            tracing::trace!("[HostRegistry] Running queued {}", next);
            self.run_cycle(next)?;
        }

        Ok(())
    }

    fn enqueue(&self, event: PendingEvent) -> LifecycleResult<()> {
        let mut pending = self.pending.borrow_mut();
        if pending.len() >= self.max_queued {
            return Err(LifecycleError::ReentrancyLimit {
                limit: self.max_queued,
            });
        }

        tracing::debug!(
            "[HostRegistry] Queued re-entrant {} ({} pending)",
            event,
            pending.len() + 1
        );
        pending.push_back(event);
        Ok(())
    }

    fn run_cycle(&self, event: PendingEvent) -> LifecycleResult<()> {
        match event {
            PendingEvent::Update => self.run_update(),
            PendingEvent::Unmount(done) => {
                self.run_unmount()?;
                done.complete();
                Ok(())
            }
        }
    }

    fn run_update(&self) -> LifecycleResult<()> {
        if self.closed.get() {
            return Ok(());
        }

        let snapshot: Vec<HookRef> = self.hooks.borrow().clone();
        tracing::trace!("[HostRegistry] Update cycle over {} hooks", snapshot.len());

        for hook in &snapshot {
            if self.unmount_queued() {
                tracing::debug!("[HostRegistry] Unmount pending, ending update cycle early");
                break;
            }
            // Detached by an earlier hook in this same cycle
            if !self.contains(hook) || !hook.is_mounted() {
                continue;
            }
            hook.update()?;
        }

        Ok(())
    }

    fn run_unmount(&self) -> LifecycleResult<()> {
        if self.closed.replace(true) {
            return Ok(());
        }
        self.pending.borrow_mut().clear();

        let snapshot: Vec<HookRef> = self.hooks.borrow().clone();
        tracing::debug!("[HostRegistry] Unmount cycle over {} hooks", snapshot.len());

        let mut result = Ok(());
        for hook in &snapshot {
            if !self.contains(hook) || !hook.is_mounted() {
                continue;
            }
            hook.set_state(HookState::Detached);
            if let Err(e) = hook.unmount() {
                result = Err(e);
                break;
            }
        }

        // The host is gone either way; hooks left after a failure are
        // dropped without their reaction.
        self.release_remaining();

        let on_close = self.on_close.borrow_mut().take();
        if let Some(on_close) = on_close {
            on_close();
        }

        result
    }

    fn release_remaining(&self) {
        let hooks = std::mem::take(&mut *self.hooks.borrow_mut());
        for hook in &hooks {
            hook.set_state(HookState::Detached);
        }
    }
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRegistry")
            .field("hooks", &self.hook_names())
            .field("closed", &self.closed.get())
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

/// Marks a registry as dispatching; resets it even when a hook fails or panics
struct DispatchGuard<'a> {
    registry: &'a HostRegistry,
}

impl<'a> DispatchGuard<'a> {
    fn enter(registry: &'a HostRegistry) -> Self {
        registry.dispatching.set(true);
        Self { registry }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.registry.dispatching.set(false);
        self.registry.pending.borrow_mut().clear();
    }
}
