//! Tracing bootstrap for hosts that want the engine's logs.
//!
//! The library only emits `tracing` events; nothing is printed until a host
//! installs a subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber filtered by `filter` (e.g. `"mind_core=debug,info"`).
///
/// An unparsable filter falls back to `info`. Returns `false` if a global
/// subscriber was already installed, so calling this twice is harmless.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("not a [valid filter");
        assert!(!init_tracing("debug"));
    }
}
