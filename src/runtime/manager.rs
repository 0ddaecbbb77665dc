//! Hook manager
//!
//! Owns the side table from host identity to that host's `HostRegistry`
//! and implements `attach`/`detach`. Hosts are tracked by `Rc` address and
//! held weakly, so the table never keeps a host alive; entries for hosts
//! dropped without an unmount are purged on the next attach, and their
//! hooks return to `Detached`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::interceptor;
use crate::core::{DuplicatePolicy, LifecycleError, LifecycleResult, ManagerConfig};
use crate::hooks::{Hook, HookRef, HostRegistry};
use crate::host::Host;

type HostKey = usize;

fn host_key<H>(host: &Rc<H>) -> HostKey {
    Rc::as_ptr(host) as *const () as usize
}

struct HostEntry {
    host: Weak<dyn Any>,
    registry: Rc<HostRegistry>,
}

impl HostEntry {
    fn host_dropped(&self) -> bool {
        self.host.strong_count() == 0
    }

    fn is_live(&self) -> bool {
        !self.host_dropped() && !self.registry.is_closed()
    }
}

struct ManagerInner {
    config: ManagerConfig,
    registries: RefCell<HashMap<HostKey, HostEntry>>,
}

impl ManagerInner {
    fn remove_entry(&self, key: HostKey, registry: &Weak<HostRegistry>) {
        let mut registries = self.registries.borrow_mut();
        let matches = registries
            .get(&key)
            .map(|entry| std::ptr::eq(Rc::as_ptr(&entry.registry), registry.as_ptr()))
            .unwrap_or(false);

        if matches {
            registries.remove(&key);
            tracing::debug!("[HookManager] Discarded registry for unmounted host");
        }
    }
}

/// Attaches hooks to hosts and tracks each host's registry
///
/// Cloning is cheap and clones share the same table. Registries live as
/// long as the manager that created them.
#[derive(Clone)]
pub struct HookManager {
    inner: Rc<ManagerInner>,
}

impl HookManager {
    /// Create a manager with the default configuration
    pub fn new() -> Self {
        Self::from_parts(ManagerConfig::default())
    }

    /// Create a manager with a validated configuration
    pub fn with_config(config: ManagerConfig) -> LifecycleResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: ManagerConfig) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                config,
                registries: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Attach a hook to a host
    ///
    /// The first attach to a host creates its registry and installs the
    /// lifecycle interceptor. The hook is appended to the dispatch order, its
    /// producer runs once and `on_mount` fires.
    ///
    /// Fails with `HostUnmounted` if the host already unmounted, and with
    /// `AlreadyAttached` if the hook is mounted anywhere (unless the duplicate
    /// policy is `Ignore`). A failing `on_mount` leaves the hook attached.
    pub fn attach<H, T>(&self, host: &Rc<H>, hook: &Rc<Hook<T>>) -> LifecycleResult<()>
    where
        H: Host + 'static,
        T: 'static,
    {
        if !host.is_mounted() {
            return Err(LifecycleError::HostUnmounted);
        }

        // Frees hooks still marked as mounted on a dropped host
        self.purge_stale();

        if hook.is_mounted() {
            match self.inner.config.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(LifecycleError::AlreadyAttached {
                        hook: hook.name().to_string(),
                    });
                }
                DuplicatePolicy::Ignore => {
                    tracing::warn!(
                        "[HookManager] Hook '{}' is already attached, ignoring",
                        hook.name()
                    );
                    return Ok(());
                }
            }
        }

        let key = host_key(host);
        let registry = match self.lookup(key) {
            Some(registry) => registry,
            None => self.install(host, key),
        };

        registry.attach(hook.clone())
    }

    /// Detach a hook from a host
    ///
    /// Runs `on_unmount`, then removes the hook. If `on_unmount` fails the
    /// error is returned and the hook stays attached. Returns `Ok(false)` without
    /// doing anything if the host has no registry or the hook is not attached
    /// to it. The interceptor stays installed.
    pub fn detach<H, T>(&self, host: &Rc<H>, hook: &Rc<Hook<T>>) -> LifecycleResult<bool>
    where
        H: Host + 'static,
        T: 'static,
    {
        let Some(registry) = self.lookup(host_key(host)) else {
            return Ok(false);
        };

        let hook: HookRef = hook.clone();
        registry.detach(&hook)
    }

    /// Registry of a host, if one exists
    pub fn registry<H: Host + 'static>(&self, host: &Rc<H>) -> Option<Rc<HostRegistry>> {
        self.lookup(host_key(host))
    }

    /// Check if a host has a registry (any hook was ever attached and the host
    /// has not unmounted)
    pub fn has_registry<H: Host + 'static>(&self, host: &Rc<H>) -> bool {
        self.registry(host).is_some()
    }

    /// Number of hooks currently attached to a host
    pub fn hook_count<H: Host + 'static>(&self, host: &Rc<H>) -> usize {
        self.registry(host).map(|r| r.len()).unwrap_or(0)
    }

    /// Check if a specific hook is attached to a host
    pub fn is_attached<H, T>(&self, host: &Rc<H>, hook: &Rc<Hook<T>>) -> bool
    where
        H: Host + 'static,
        T: 'static,
    {
        let hook: HookRef = hook.clone();
        self.registry(host)
            .map(|r| r.contains(&hook))
            .unwrap_or(false)
    }

    /// Number of hosts with a live registry
    pub fn registry_count(&self) -> usize {
        self.purge_stale();
        self.inner.registries.borrow().len()
    }

    /// Drop entries whose host is gone or already unmounted
    ///
    /// Hooks of a host dropped without unmount are detached without any
    /// reaction, so they can be attached to another host. Returns the number
    /// of entries removed.
    pub fn purge_stale(&self) -> usize {
        let stale: Vec<HostEntry> = {
            let mut registries = self.inner.registries.borrow_mut();
            let keys: Vec<HostKey> = registries
                .iter()
                .filter(|(_, entry)| !entry.is_live())
                .map(|(key, _)| *key)
                .collect();
            keys.iter().filter_map(|key| registries.remove(key)).collect()
        };

        let dropped = stale.iter().filter(|entry| entry.host_dropped()).count();
        for entry in &stale {
            Self::release_dropped(entry);
        }

        if dropped > 0 {
            tracing::warn!(
                "[HookManager] Purged {} registries of hosts dropped without unmount",
                dropped
            );
        }
        stale.len()
    }

    fn lookup(&self, key: HostKey) -> Option<Rc<HostRegistry>> {
        let stale = {
            let mut registries = self.inner.registries.borrow_mut();
            let entry = registries.get(&key)?;
            if entry.is_live() {
                return Some(entry.registry.clone());
            }
            registries.remove(&key)?
        };

        Self::release_dropped(&stale);
        None
    }

    /// A closed registry is still running (or has finished) its unmount
    /// cycle and owns its hooks; only a dropped host's hooks are released.
    fn release_dropped(entry: &HostEntry) {
        if entry.host_dropped() && !entry.registry.is_closed() {
            entry.registry.release();
        }
    }

    fn install<H: Host + 'static>(&self, host: &Rc<H>, key: HostKey) -> Rc<HostRegistry> {
        let registry = Rc::new(HostRegistry::new(self.inner.config.max_queued_events));

        let inner = Rc::downgrade(&self.inner);
        let this = Rc::downgrade(&registry);
        registry.set_on_close(move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove_entry(key, &this);
            }
        });

        interceptor::install(&**host, &registry);

        let weak_host: Weak<H> = Rc::downgrade(host);
        let weak_host: Weak<dyn Any> = weak_host;
        self.inner.registries.borrow_mut().insert(
            key,
            HostEntry {
                host: weak_host,
                registry: registry.clone(),
            },
        );

        tracing::debug!("[HookManager] Created registry for new host");
        registry
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("config", &self.inner.config)
            .field("registries", &self.inner.registries.borrow().len())
            .finish()
    }
}

thread_local! {
    static DEFAULT_MANAGER: HookManager = HookManager::new();
}

/// The calling thread's default manager
pub fn default_manager() -> HookManager {
    DEFAULT_MANAGER.with(|manager| manager.clone())
}

/// Attach a hook to a host using the thread's default manager
pub fn attach<H, T>(host: &Rc<H>, hook: &Rc<Hook<T>>) -> LifecycleResult<()>
where
    H: Host + 'static,
    T: 'static,
{
    default_manager().attach(host, hook)
}

/// Detach a hook from a host using the thread's default manager
pub fn detach<H, T>(host: &Rc<H>, hook: &Rc<Hook<T>>) -> LifecycleResult<bool>
where
    H: Host + 'static,
    T: 'static,
{
    default_manager().detach(host, hook)
}
