//! Tracing subscriber setup. Call `init()` once from the composition root;
//! repeated calls are no-ops so embedding hosts and tests can both call it.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Install the global tracing subscriber according to `ObservabilityConfig`.
///
/// Level resolution: `LIVEDOC_LOG_LEVEL` if set, else `warn` in quiet mode,
/// else `info`. `LIVEDOC_LOG_JSON=1` switches to JSON output.
pub fn init() {
    INIT.call_once(|| {
        let cfg = ObservabilityConfig::from_env();
        let default_level = if cfg.quiet { "warn" } else { "info" };
        let filter = EnvFilter::try_new(
            cfg.log_level
                .as_deref()
                .unwrap_or(default_level),
        )
        .unwrap_or_else(|_| EnvFilter::new(default_level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);
        let result = if cfg.log_json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        // Another subscriber may already be installed by the host; fine.
        if let Err(e) = result {
            tracing::debug!("tracing subscriber already set: {e}");
        }
    });
}
