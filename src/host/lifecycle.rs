//! Host lifecycle contract and the stock notifier implementation

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::LifecycleResult;

/// Callback a host runs when it delivers an update notification
pub type Listener = Rc<dyn Fn() -> LifecycleResult<()>>;

/// Callback a host runs when it delivers the unmount notification
///
/// The listener must call `complete()` on the handed completion once its own
/// unmount work is done. That may happen later than the listener call, for
/// example when the unmount was queued behind a running dispatch cycle.
pub type UnmountListener = Rc<dyn Fn(Rc<UnmountCompletion>) -> LifecycleResult<()>>;

/// Countdown that runs the host's own unmount handling after every
/// unmount listener has finished
///
/// Dropping it before the count reaches zero (a failed dispatch) means the
/// handler never runs.
pub struct UnmountCompletion {
    outstanding: Cell<usize>,
    finish: RefCell<Option<Rc<dyn Fn()>>>,
}

impl UnmountCompletion {
    /// Create a completion that fires `finish` after `outstanding` calls
    /// to `complete()`
    pub fn new(outstanding: usize, finish: Option<Rc<dyn Fn()>>) -> Rc<Self> {
        let completion = Rc::new(Self {
            outstanding: Cell::new(outstanding),
            finish: RefCell::new(finish),
        });
        if outstanding == 0 {
            completion.fire();
        }
        completion
    }

    /// Report one participant as done
    pub fn complete(&self) {
        let outstanding = self.outstanding.get().saturating_sub(1);
        self.outstanding.set(outstanding);
        if outstanding == 0 {
            self.fire();
        }
    }

    /// Whether every participant has completed
    pub fn is_finished(&self) -> bool {
        self.outstanding.get() == 0
    }

    fn fire(&self) {
        let finish = self.finish.borrow_mut().take();
        if let Some(finish) = finish {
            finish();
        }
    }
}

impl std::fmt::Debug for UnmountCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnmountCompletion")
            .field("outstanding", &self.outstanding.get())
            .finish()
    }
}

/// A long-lived object whose lifecycle drives hook dispatch
///
/// The host owns its lifecycle: mount is implicit at construction, then
/// zero or more updates, then exactly one unmount. The hook runtime never
/// touches the host's own handlers; it only registers listeners that the
/// host must run *before* its own update/unmount handling. For unmount, the
/// host's own handling waits until every listener has completed the
/// `UnmountCompletion` it was given.
pub trait Host {
    /// Register a listener for every future update notification
    fn add_update_listener(&self, listener: Listener);

    /// Register a listener for the unmount notification
    fn add_unmount_listener(&self, listener: UnmountListener);

    /// Whether the host can still accept hooks
    fn is_mounted(&self) -> bool {
        true
    }
}

/// Stock `Host` implementation
///
/// Embed one in a host type (or use it directly as the host). `A` is
/// whatever the host's own update handler receives, typically previous
/// props/state; it is handed to that handler untouched.
///
/// ```ignore
/// let lifecycle = HostLifecycle::new()
///     .with_update_handler(|previous: &u32| println!("was {previous}"))
///     .with_unmount_handler(|| println!("bye"));
///
/// lifecycle.notify_update(&1)?;
/// lifecycle.notify_unmount()?;
/// ```
pub struct HostLifecycle<A> {
    update_listeners: RefCell<Vec<Listener>>,
    unmount_listeners: RefCell<Vec<UnmountListener>>,
    update_handler: Option<Box<dyn Fn(&A)>>,
    unmount_handler: Option<Rc<dyn Fn()>>,
    unmounted: Cell<bool>,
    updates: Cell<u64>,
}

impl<A> HostLifecycle<A> {
    /// Create a lifecycle with no original handlers
    pub fn new() -> Self {
        Self {
            update_listeners: RefCell::new(Vec::new()),
            unmount_listeners: RefCell::new(Vec::new()),
            update_handler: None,
            unmount_handler: None,
            unmounted: Cell::new(false),
            updates: Cell::new(0),
        }
    }

    /// Set the host's own update handler
    pub fn with_update_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&A) + 'static,
    {
        self.update_handler = Some(Box::new(handler));
        self
    }

    /// Set the host's own unmount handler
    pub fn with_unmount_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.unmount_handler = Some(Rc::new(handler));
        self
    }

    /// Deliver an update: listeners first, then the host's own handler
    ///
    /// A listener error stops the notification; the host handler does not
    /// run for it. Updates after unmount are ignored, and so is the handler
    /// of an update during which a listener unmounted the host.
    pub fn notify_update(&self, args: &A) -> LifecycleResult<()> {
        if self.unmounted.get() {
            tracing::warn!("[HostLifecycle] Update after unmount ignored");
            return Ok(());
        }

        self.updates.set(self.updates.get() + 1);

        let listeners = self.update_listeners.borrow().clone();
        for listener in listeners {
            listener()?;
        }

        if self.unmounted.get() {
            tracing::debug!("[HostLifecycle] Host unmounted during update, skipping handler");
            return Ok(());
        }

        if let Some(handler) = &self.update_handler {
            handler(args);
        }
        Ok(())
    }

    /// Deliver the unmount: listeners first, then the host's own handler
    ///
    /// The handler runs once every listener has completed. A listener that
    /// defers its work (the host was unmounted from inside a running
    /// dispatch cycle) also defers the handler until that work is done.
    /// Only the first call has any effect.
    pub fn notify_unmount(&self) -> LifecycleResult<()> {
        if self.unmounted.replace(true) {
            return Ok(());
        }

        let listeners = std::mem::take(&mut *self.unmount_listeners.borrow_mut());
        self.update_listeners.borrow_mut().clear();

        // One share per listener plus one for this call
        let completion = UnmountCompletion::new(listeners.len() + 1, self.unmount_handler.clone());
        for listener in listeners {
            listener(completion.clone())?;
        }

        completion.complete();
        if !completion.is_finished() {
            tracing::debug!("[HostLifecycle] Unmount handler deferred until hooks finish");
        }
        Ok(())
    }

    /// Number of update notifications delivered so far
    pub fn update_count(&self) -> u64 {
        self.updates.get()
    }

    /// Number of registered update listeners
    pub fn update_listener_count(&self) -> usize {
        self.update_listeners.borrow().len()
    }

    /// Number of registered unmount listeners
    pub fn unmount_listener_count(&self) -> usize {
        self.unmount_listeners.borrow().len()
    }
}

impl<A> Default for HostLifecycle<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Host for HostLifecycle<A> {
    fn add_update_listener(&self, listener: Listener) {
        self.update_listeners.borrow_mut().push(listener);
    }

    fn add_unmount_listener(&self, listener: UnmountListener) {
        self.unmount_listeners.borrow_mut().push(listener);
    }

    fn is_mounted(&self) -> bool {
        !self.unmounted.get()
    }
}

impl<A> std::fmt::Debug for HostLifecycle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLifecycle")
            .field("update_listeners", &self.update_listener_count())
            .field("unmount_listeners", &self.unmount_listener_count())
            .field("unmounted", &self.unmounted.get())
            .field("updates", &self.updates.get())
            .finish()
    }
}
