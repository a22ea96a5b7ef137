//! Diagnostic tracing for the dungeon binary.
//!
//! Player-facing text goes to stdout; tracing goes to stderr and is silent
//! below `warn` unless `RUST_LOG` says otherwise.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// ```bash
/// RUST_LOG=game_rules=debug,narrative_core=info dungeon
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
