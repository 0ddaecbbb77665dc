//! Lifecycle interceptor
//!
//! Composes hook dispatch onto a host's update and unmount notifications.
//! The host runs these listeners ahead of its own handlers, so hooks always
//! see a notification before the host's original handling of it. The unmount
//! listener completes the host's `UnmountCompletion` only after every hook
//! has run its unmount reaction, even when that dispatch had to be queued.
//!
//! `install` must run at most once per host: a second install would
//! dispatch every hook twice per event. `HookManager` only calls it from the
//! branch that creates the host's registry.

use std::rc::Rc;

use crate::hooks::HostRegistry;
use crate::host::{Host, UnmountCompletion};

/// Register the registry's update and unmount dispatch with a host
///
/// Listeners hold the registry weakly; once the owning manager discards
/// it they become no-ops.
pub(crate) fn install<H: Host + ?Sized>(host: &H, registry: &Rc<HostRegistry>) {
    let weak = Rc::downgrade(registry);
    host.add_update_listener(Rc::new(move || match weak.upgrade() {
        Some(registry) => registry.dispatch_update(),
        None => Ok(()),
    }));

    let weak = Rc::downgrade(registry);
    host.add_unmount_listener(Rc::new(move |done: Rc<UnmountCompletion>| {
        match weak.upgrade() {
            Some(registry) => registry.dispatch_unmount(done),
            None => {
                done.complete();
                Ok(())
            }
        }
    }));

    tracing::debug!("[Interceptor] Installed lifecycle listeners on host");
}
