use serde_json::Value;
use tracing::warn;

/// Logging capability consumed by the watchdog.
///
/// Closures of the shape `Fn(&str, &[Value])` are loggers too.
pub trait PoolLogger: Send + Sync + 'static {
    fn warn(&self, message: &str, data: &[Value]);
}

impl<F> PoolLogger for F
where
    F: Fn(&str, &[Value]) + Send + Sync + 'static,
{
    fn warn(&self, message: &str, data: &[Value]) {
        self(message, data)
    }
}

/// Default logger: forwards to `tracing::warn!` with the payload as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PoolLogger for TracingLogger {
    fn warn(&self, message: &str, data: &[Value]) {
        let data = Value::Array(data.to_vec());
        warn!(target: "dog_pool", data = %data, "{}", message);
    }
}
