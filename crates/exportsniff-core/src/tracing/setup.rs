//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "EXPORTSNIFF_LOG";

static INIT: Once = Once::new();

/// Initialize the exportsniff tracing/logging system.
///
/// Reads `EXPORTSNIFF_LOG` for per-module log levels.
/// Format: `EXPORTSNIFF_LOG=exportsniff_detect::detector=debug,exportsniff_detect::cache=warn`
///
/// Falls back to `exportsniff=info` if `EXPORTSNIFF_LOG` is not set or is invalid.
/// Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("exportsniff=info"));

        // An embedding application may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
