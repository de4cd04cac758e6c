//! Tracing subscriber setup driven by [`LoggingConfig`].

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

static INSTALLED_FILTER: OnceLock<String> = OnceLock::new();

/// Install a global fmt subscriber filtered by `RUST_LOG`, or by
/// `config.level` when `RUST_LOG` is unset or unparsable.
///
/// Returns `false` when a global subscriber was already installed, either by
/// an earlier call or by the embedding application; the existing one is kept.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.level.to_ascii_lowercase()));
    let directives = filter.to_string();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        let _ = INSTALLED_FILTER.set(directives);
        tracing::debug!(level = %config.level, "tracing initialised");
    }
    installed
}

/// Filter directives of the subscriber installed by [`init_tracing`], if any.
pub fn installed_filter() -> Option<&'static str> {
    INSTALLED_FILTER.get().map(String::as_str)
}
