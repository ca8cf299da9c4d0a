//! Telemetry initialization module (normal rust tracing, fmt subscriber, etc.)
//!
//! Log filtering follows the standard `RUST_LOG` environment variable and
//! defaults to `info` when unset:
//!
//! ```bash
//! export RUST_LOG="gymctl=debug,tower_http=debug"
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing with console output.
///
/// Fails if a global subscriber is already installed, which only happens when
/// it is called twice from the same process.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");

    Ok(())
}
