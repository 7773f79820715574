use std::sync::Arc;
use std::time::Duration;

use crate::batch::BatchRunner;
use crate::delivery::{AccumulatingPool, OutcomeHandler, PromisePool, StreamingPool};
use crate::observability::{PoolLogger, TracingLogger};
use crate::types::JobProperties;
use crate::{PoolConfig, PoolResult};

/// Builder shared by every pool flavor.
///
/// ```rust
/// use std::time::Duration;
/// use dog_pool::{PoolBuilder, PromisePool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> dog_pool::PoolResult<()> {
/// let pool: PromisePool<String, Vec<u8>, std::io::Error> = PoolBuilder::new(8)
///     .watchdog_interval(Duration::from_secs(30))
///     .logger(|message: &str, data: &[serde_json::Value]| eprintln!("{message} {data:?}"))
///     .promise()?;
/// assert_eq!(pool.concurrency(), 8);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PoolBuilder {
    config: PoolConfig,
    logger: Arc<dyn PoolLogger>,
}

impl PoolBuilder {
    pub fn new(concurrency: usize) -> Self {
        Self::from_config(PoolConfig::new(concurrency))
    }

    pub fn from_config(config: PoolConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger),
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn watchdog_interval(mut self, interval: Duration) -> Self {
        self.config.watchdog_interval = interval;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Logger used by the long-running job watchdog
    pub fn logger(mut self, logger: impl PoolLogger) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn shared_logger(mut self, logger: Arc<dyn PoolLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn accumulating<P, T, E>(self) -> PoolResult<AccumulatingPool<P, T, E>>
    where
        P: JobProperties,
        T: Send + 'static,
        E: Send + 'static,
    {
        AccumulatingPool::build(self.config, self.logger)
    }

    pub fn promise<P, T, E>(self) -> PoolResult<PromisePool<P, T, E>>
    where
        P: JobProperties,
        T: Send + 'static,
        E: Send + 'static,
    {
        PromisePool::build(self.config, self.logger)
    }

    pub fn streaming<P, T, E>(
        self,
        handler: impl OutcomeHandler<P, T, E>,
    ) -> PoolResult<StreamingPool<P, T, E>>
    where
        P: JobProperties,
        T: Send + 'static,
        E: Send + 'static,
    {
        StreamingPool::build(self.config, self.logger, Box::new(handler))
    }

    /// One-shot runner for a fixed list of jobs
    pub fn batch(self) -> PoolResult<BatchRunner> {
        BatchRunner::build(self.config, self.logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolError;

    #[test]
    fn test_builder_overrides_config() {
        let builder = PoolBuilder::new(2)
            .concurrency(5)
            .watchdog_interval(Duration::from_secs(1))
            .event_capacity(8);

        assert_eq!(builder.config().concurrency, 5);
        assert_eq!(builder.config().watchdog_interval, Duration::from_secs(1));
        assert_eq!(builder.config().event_capacity, 8);
    }

    #[test]
    fn test_every_flavor_validates() {
        assert!(matches!(
            PoolBuilder::new(0).accumulating::<(), (), ()>(),
            Err(PoolError::InvalidConcurrency(0))
        ));
        assert!(matches!(
            PoolBuilder::new(0).promise::<(), (), ()>(),
            Err(PoolError::InvalidConcurrency(0))
        ));
        assert!(matches!(
            PoolBuilder::new(0).batch(),
            Err(PoolError::InvalidConcurrency(0))
        ));
    }
}
