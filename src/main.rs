use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use lifecycle_hooks::core::LifecycleResult;
use lifecycle_hooks::hooks::{FnReactions, Hook, Reactions};
use lifecycle_hooks::host::{Host, HostLifecycle, Listener, UnmountListener};
use lifecycle_hooks::logging;
use lifecycle_hooks::runtime::{attach, detach};

/// A host that counts timer ticks
struct Clock {
    ticks: Cell<u32>,
    lifecycle: HostLifecycle<u32>,
}

impl Clock {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            ticks: Cell::new(0),
            lifecycle: HostLifecycle::new()
                .with_update_handler(|previous: &u32| {
                    tracing::debug!("[Clock] Handled update (previous tick {})", previous)
                })
                .with_unmount_handler(|| tracing::info!("[Clock] Unmounted")),
        })
    }

    fn tick(&self) -> LifecycleResult<()> {
        let previous = self.ticks.replace(self.ticks.get() + 1);
        self.lifecycle.notify_update(&previous)
    }
}

impl Host for Clock {
    fn add_update_listener(&self, listener: Listener) {
        self.lifecycle.add_update_listener(listener);
    }

    fn add_unmount_listener(&self, listener: UnmountListener) {
        self.lifecycle.add_unmount_listener(listener);
    }

    fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }
}

/// Logs every parity change of the tick count
struct ParityWatcher {
    flips: Cell<u32>,
}

impl Reactions<bool> for ParityWatcher {
    fn on_mount(&self, even: &bool) -> anyhow::Result<()> {
        tracing::info!("[ParityWatcher] Mounted, even = {}", even);
        Ok(())
    }

    fn on_update(&self, even: &bool, previous: &bool) -> anyhow::Result<()> {
        if even != previous {
            self.flips.set(self.flips.get() + 1);
            tracing::info!("[ParityWatcher] Parity flipped to even = {}", even);
        }
        Ok(())
    }

    fn on_unmount(&self, _even: &bool) -> anyhow::Result<()> {
        tracing::info!("[ParityWatcher] Unmounted after {} flips", self.flips.get());
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    tracing::info!("=== Lifecycle Hooks Demo Starting ===");

    let clock = Clock::new();

    let source = Rc::downgrade(&clock);
    let parity = Rc::new(
        Hook::new(
            move || source.upgrade().map(|c| c.ticks.get() % 2 == 0).unwrap_or(true),
            ParityWatcher {
                flips: Cell::new(0),
            },
        )
        .with_name("parity"),
    );

    let source = Rc::downgrade(&clock);
    let echo = Rc::new(
        Hook::new(
            move || source.upgrade().map(|c| c.ticks.get()).unwrap_or(0),
            FnReactions::new().with_update(|ticks: &u32, previous: &u32| {
                tracing::info!("[Echo] Tick {} -> {}", previous, ticks);
                Ok(())
            }),
        )
        .with_name("echo"),
    );

    attach(&clock, &parity)?;
    attach(&clock, &echo)?;

    let mut interval = tokio::time::interval(Duration::from_millis(200));
    for round in 0..6 {
        interval.tick().await;
        clock.tick()?;

        if round == 2 {
            detach(&clock, &echo)?;
            tracing::info!("[Demo] Echo hook detached");
        }
    }

    clock.lifecycle.notify_unmount()?;

    tracing::info!("=== Lifecycle Hooks Demo Finished ===");

    Ok(())
}
