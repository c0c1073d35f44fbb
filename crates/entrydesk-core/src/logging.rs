//! Log output for binaries built on this crate.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter, e.g. `entrydesk_core=debug`.
pub const LOG_ENV: &str = "ENTRYDESK_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Installs a stderr subscriber filtered by `ENTRYDESK_LOG` (default: `warn`).
///
/// Calling it twice is harmless; the first subscriber stays.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
