//! Bootstrap utilities for processes embedding hearth.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "HEARTH_LOG";

/// Initialize tracing with the `HEARTH_LOG` environment variable.
///
/// Defaults to "info" level if `HEARTH_LOG` is not set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
