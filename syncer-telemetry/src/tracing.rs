use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Guards [`init_test_tracing`] so that repeated calls from different tests are no-ops.
static TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
    /// The `log` crate bridge could not be installed.
    #[error("failed to install log bridge: {0}")]
    LogBridge(String),
}

/// Installs the global tracing subscriber for a service.
///
/// Log levels come from `RUST_LOG` and default to `info`. Records emitted through the `log`
/// crate are forwarded to `tracing`.
pub fn init_tracing(app_name: &str) -> Result<(), TracingError> {
    tracing_log::LogTracer::init().map_err(|err| TracingError::LogBridge(err.to_string()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
        .map_err(|err| TracingError::Subscriber(err.to_string()))?;

    ::tracing::info!(app = app_name, "tracing initialized");

    Ok(())
}

/// Installs a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();

        ::tracing::debug!("still alive after double init");
    }
}
