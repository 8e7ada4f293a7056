//! Log subscriber setup.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the stderr subscriber.
///
/// Reads `SHIPCHECK_LOG` for per-target levels, e.g.
/// `SHIPCHECK_LOG=shipcheck_engine::normalize=debug`. Falls back to
/// `shipcheck=info` when unset or invalid. Engine crates log through `log`;
/// the subscriber's log bridge picks those records up. Stdout is left alone
/// so `--json` output stays a single value.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SHIPCHECK_LOG")
            .unwrap_or_else(|_| EnvFilter::new("shipcheck=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
