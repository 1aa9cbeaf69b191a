use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "rusty_library_ledger=debug,sqlx=warn";

/// Install the global tracing subscriber.
///
/// Reads the filter from `RUST_LOG`, falling back to `default_filter`.
/// Returns `false` if a global subscriber was already installed, which
/// happens when several tests initialize logging in the same process.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
