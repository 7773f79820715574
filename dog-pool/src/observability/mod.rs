pub mod logger;
pub mod metrics;
pub mod events;

pub use logger::{PoolLogger, TracingLogger};
pub use metrics::{PoolMetrics, MetricsSnapshot};
pub use events::{PoolEvent, EventBus};

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`.
///
/// Meant for binaries and examples; libraries should leave subscriber
/// setup to the application.
#[cfg(feature = "tracing-basic")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
