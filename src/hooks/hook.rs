//! Hook base capability
//!
//! Contains:
//! - `Reactions` trait - the three overridable lifecycle reactions
//! - `FnReactions` - reactions assembled from optional closures
//! - `Hook` - a properties producer, its last snapshot and its reactions
//! - `HookBuilder` - fallible construction when the producer may be missing

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::{HookState, LifecycleError, LifecycleEvent, LifecycleResult};

/// Lifecycle reactions of a hook
///
/// Every method defaults to a no-op, so implementors override only what they
/// need. Methods take `&self`; a variant that keeps its own state (a timer
/// handle, a "still mounted" flag for late async results) uses `Cell` or
/// `RefCell` for it.
///
/// Returning an error aborts the rest of the current dispatch cycle.
pub trait Reactions<T>: 'static {
    /// Called once after the hook is attached and its properties computed
    fn on_mount(&self, _props: &T) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on every host update with the fresh and the previous snapshot
    ///
    /// Comparing the two is up to the hook.
    fn on_update(&self, _props: &T, _previous: &T) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the hook leaves the registry
    fn on_unmount(&self, _props: &T) -> anyhow::Result<()> {
        Ok(())
    }
}

/// No reactions at all; useful when only the properties matter
impl<T> Reactions<T> for () {}

type MountFn<T> = Box<dyn Fn(&T) -> anyhow::Result<()>>;
type UpdateFn<T> = Box<dyn Fn(&T, &T) -> anyhow::Result<()>>;

/// Reactions built from independent, optional closures
///
/// ```ignore
/// let reactions = FnReactions::new()
///     .with_update(|props: &Counter, previous: &Counter| {
///         println!("{} -> {}", previous.value, props.value);
///         Ok(())
///     });
/// ```
pub struct FnReactions<T> {
    mount: Option<MountFn<T>>,
    update: Option<UpdateFn<T>>,
    unmount: Option<MountFn<T>>,
}

impl<T> FnReactions<T> {
    /// Create reactions where every slot is a no-op
    pub fn new() -> Self {
        Self {
            mount: None,
            update: None,
            unmount: None,
        }
    }

    /// Set the mount reaction
    pub fn with_mount<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + 'static,
    {
        self.mount = Some(Box::new(f));
        self
    }

    /// Set the update reaction
    pub fn with_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &T) -> anyhow::Result<()> + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    /// Set the unmount reaction
    pub fn with_unmount<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + 'static,
    {
        self.unmount = Some(Box::new(f));
        self
    }
}

impl<T> Default for FnReactions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Reactions<T> for FnReactions<T> {
    fn on_mount(&self, props: &T) -> anyhow::Result<()> {
        match &self.mount {
            Some(f) => f(props),
            None => Ok(()),
        }
    }

    fn on_update(&self, props: &T, previous: &T) -> anyhow::Result<()> {
        match &self.update {
            Some(f) => f(props, previous),
            None => Ok(()),
        }
    }

    fn on_unmount(&self, props: &T) -> anyhow::Result<()> {
        match &self.unmount {
            Some(f) => f(props),
            None => Ok(()),
        }
    }
}

/// An attachable unit of reactive behavior
///
/// Identity is the `Rc` allocation: two hooks with equal properties are
/// still different hooks. Share it as `Rc<Hook<T>>` and pass the same `Rc`
/// to `attach` and `detach`.
pub struct Hook<T> {
    name: String,
    producer: Box<dyn Fn() -> T>,
    properties: RefCell<Option<Rc<T>>>,
    reactions: Box<dyn Reactions<T>>,
    state: Cell<HookState>,
}

impl<T: 'static> Hook<T> {
    /// Create a detached hook from a producer and its reactions
    ///
    /// The producer should read whatever ambient host state the hook cares
    /// about; it runs once on mount and once per host update.
    pub fn new<P, R>(producer: P, reactions: R) -> Self
    where
        P: Fn() -> T + 'static,
        R: Reactions<T>,
    {
        Self {
            name: short_type_name::<R>(),
            producer: Box::new(producer),
            properties: RefCell::new(None),
            reactions: Box::new(reactions),
            state: Cell::new(HookState::Detached),
        }
    }

    /// Start building a hook whose producer is supplied at runtime
    pub fn builder() -> HookBuilder<T> {
        HookBuilder::new()
    }

    /// Set the diagnostic name used in logs and errors
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> HookState {
        self.state.get()
    }

    /// Check if the hook is attached to a host
    pub fn is_mounted(&self) -> bool {
        self.state.get().is_mounted()
    }

    /// Last computed properties snapshot (`None` before the first mount)
    pub fn properties(&self) -> Option<Rc<T>> {
        self.properties.borrow().clone()
    }

    fn refresh(&self) -> (Rc<T>, Option<Rc<T>>) {
        // Producer runs with no borrow held; it may read anything.
        let next = Rc::new((self.producer)());
        let previous = self.properties.replace(Some(next.clone()));
        (next, previous)
    }

    fn wrap(&self, event: LifecycleEvent, result: anyhow::Result<()>) -> LifecycleResult<()> {
        result.map_err(|e| LifecycleError::reaction(self.name.clone(), event, e))
    }
}

impl<T> std::fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("has_properties", &self.properties.borrow().is_some())
            .finish()
    }
}

/// Type-erased view of a hook used by the registry
pub(crate) trait Dispatch {
    fn name(&self) -> &str;
    fn is_mounted(&self) -> bool;
    fn set_state(&self, state: HookState);
    fn mount(&self) -> LifecycleResult<()>;
    fn update(&self) -> LifecycleResult<()>;
    fn unmount(&self) -> LifecycleResult<()>;
}

impl<T: 'static> Dispatch for Hook<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_mounted(&self) -> bool {
        self.state.get().is_mounted()
    }

    fn set_state(&self, state: HookState) {
        self.state.set(state);
    }

    fn mount(&self) -> LifecycleResult<()> {
        let (props, _) = self.refresh();
        self.wrap(LifecycleEvent::Mount, self.reactions.on_mount(&props))
    }

    fn update(&self) -> LifecycleResult<()> {
        let (props, previous) = self.refresh();
        // A mount whose producer panicked leaves no snapshot behind.
        let previous = previous.unwrap_or_else(|| props.clone());
        self.wrap(
            LifecycleEvent::Update,
            self.reactions.on_update(&props, &previous),
        )
    }

    fn unmount(&self) -> LifecycleResult<()> {
        let Some(props) = self.properties() else {
            return Ok(());
        };
        self.wrap(LifecycleEvent::Unmount, self.reactions.on_unmount(&props))
    }
}

/// Builder for hooks whose producer is only known at runtime
///
/// `build()` fails with `LifecycleError::InvalidArgument` when no producer
/// was supplied, before the hook can be attached anywhere.
pub struct HookBuilder<T> {
    name: Option<String>,
    producer: Option<Box<dyn Fn() -> T>>,
    reactions: Option<Box<dyn Reactions<T>>>,
}

impl<T: 'static> HookBuilder<T> {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            name: None,
            producer: None,
            reactions: None,
        }
    }

    /// Set the diagnostic name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the properties producer
    pub fn producer<P>(mut self, producer: P) -> Self
    where
        P: Fn() -> T + 'static,
    {
        self.producer = Some(Box::new(producer));
        self
    }

    /// Set an optional, already boxed producer
    pub fn boxed_producer(mut self, producer: Option<Box<dyn Fn() -> T>>) -> Self {
        self.producer = producer;
        self
    }

    /// Set the reactions (defaults to no-ops)
    pub fn reactions<R: Reactions<T>>(mut self, reactions: R) -> Self {
        if self.name.is_none() {
            self.name = Some(short_type_name::<R>());
        }
        self.reactions = Some(Box::new(reactions));
        self
    }

    /// Build the hook
    pub fn build(self) -> LifecycleResult<Hook<T>> {
        let producer = self
            .producer
            .ok_or_else(|| LifecycleError::invalid_argument("properties producer is required"))?;

        Ok(Hook {
            name: self.name.unwrap_or_else(|| DEFAULT_HOOK_NAME.to_string()),
            producer,
            properties: RefCell::new(None),
            reactions: self.reactions.unwrap_or_else(|| Box::new(())),
            state: Cell::new(HookState::Detached),
        })
    }
}

impl<T: 'static> Default for HookBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_HOOK_NAME: &str = "hook";

fn short_type_name<R>() -> String {
    let full = std::any::type_name::<R>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);

    // Tuples, references and closures have no usable path name
    if short.starts_with(|c: char| c.is_alphabetic()) && !short.contains('{') {
        short.to_string()
    } else {
        DEFAULT_HOOK_NAME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tracker {
        seen: RefCell<Vec<String>>,
    }

    impl Reactions<u32> for Rc<Tracker> {
        fn on_update(&self, props: &u32, previous: &u32) -> anyhow::Result<()> {
            self.seen.borrow_mut().push(format!("{} -> {}", previous, props));
            Ok(())
        }
    }

    #[test]
    fn test_new_hook_is_detached() {
        let hook = Hook::new(|| 1u32, ());
        assert_eq!(hook.state(), HookState::Detached);
        assert!(hook.properties().is_none());
    }

    #[test]
    fn test_default_name_from_reactions_type() {
        let hook = Hook::new(|| 1u32, FnReactions::new());
        assert_eq!(hook.name(), "FnReactions");

        let hook = hook.with_name("counter");
        assert_eq!(hook.name(), "counter");
    }

    #[test]
    fn test_unit_reactions_fall_back_to_default_name() {
        let hook = Hook::new(|| 1u32, ());
        assert_eq!(hook.name(), "hook");

        let hook = Hook::builder().producer(|| 1u32).reactions(()).build().unwrap();
        assert_eq!(hook.name(), "hook");
    }

    #[test]
    fn test_builder_requires_producer() {
        let err = Hook::<u32>::builder().name("empty").build().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)));

        let err = Hook::<u32>::builder().boxed_producer(None).build().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)));

        let hook = Hook::builder().producer(|| 5u32).build().unwrap();
        assert_eq!(hook.name(), "hook");
    }

    #[test]
    fn test_update_passes_previous_snapshot() {
        let value = Rc::new(Cell::new(1u32));
        let tracker = Rc::new(Tracker {
            seen: RefCell::new(Vec::new()),
        });

        let source = value.clone();
        let hook = Hook::new(move || source.get(), tracker.clone());

        hook.mount().unwrap();
        assert_eq!(hook.properties().as_deref(), Some(&1));

        value.set(2);
        hook.update().unwrap();
        assert_eq!(hook.properties().as_deref(), Some(&2));
        assert_eq!(&*tracker.seen.borrow(), &vec!["1 -> 2".to_string()]);
    }

    #[test]
    fn test_unmount_does_not_run_producer() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let hook = Hook::new(
            move || {
                counter.set(counter.get() + 1);
                0u8
            },
            (),
        );

        hook.set_state(HookState::Mounted);
        hook.mount().unwrap();
        hook.unmount().unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(hook.properties().as_deref(), Some(&0));
    }

    #[test]
    fn test_reaction_error_is_wrapped() {
        let hook = Hook::new(
            || 0u8,
            FnReactions::new().with_mount(|_| Err(anyhow::anyhow!("boom"))),
        )
        .with_name("failing");

        let err = hook.mount().unwrap_err();
        match err {
            LifecycleError::Reaction { hook, event, .. } => {
                assert_eq!(hook, "failing");
                assert_eq!(event, LifecycleEvent::Mount);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
