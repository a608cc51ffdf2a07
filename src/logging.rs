//! Subscriber setup for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Environment variable read when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "AITOOL_LOG";

/// Install a fmt subscriber once.
///
/// `RUST_LOG` wins, then `AITOOL_LOG`, then `default_level`. Calling this again
/// (or after another subscriber was installed) is a no-op.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
