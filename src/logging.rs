//! Logging setup
//!
//! The library only emits `tracing` events; binaries pick a subscriber.
//! These helpers install the usual `fmt` subscriber with an `EnvFilter`.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Install a global fmt subscriber honoring `RUST_LOG` (default: `info`)
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter)
}

/// Install a global fmt subscriber with an explicit filter directive
///
/// e.g. `"lifecycle_hooks=trace"`.
pub fn init_logging_with(directives: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(directives)?;
    install(filter)
}

fn install(filter: EnvFilter) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_directive_rejected() {
        assert!(init_logging_with("lifecycle_hooks=notalevel").is_err());
    }
}
