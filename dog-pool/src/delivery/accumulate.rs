use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Delivery;
use crate::builder::PoolBuilder;
use crate::engine::{pool_controls, Engine};
use crate::job::Job;
use crate::observability::PoolLogger;
use crate::types::{JobKey, JobProperties, Outcome};
use crate::{PoolConfig, PoolResult};

/// Append-only outcome list, in completion order
pub(crate) struct Accumulator<P, T, E> {
    results: Mutex<Vec<Outcome<P, T, E>>>,
}

#[async_trait]
impl<P, T, E> Delivery<P, T, E> for Accumulator<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn deliver(&self, _key: JobKey, outcome: Outcome<P, T, E>) {
        self.results.lock().push(outcome);
    }
}

/// Pool that collects every outcome for the caller to read later.
///
/// ```rust
/// use dog_pool::{AccumulatingPool, Job};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> dog_pool::PoolResult<()> {
/// let pool = AccumulatingPool::new(2)?;
/// for n in 0..4_u32 {
///     pool.submit(Job::from_fn(n, |ctx| async move { Ok::<_, String>(ctx.properties * 10) }))?;
/// }
/// pool.wait_for_idle().await;
/// assert_eq!(pool.result_count(), 4);
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct AccumulatingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    engine: Arc<Engine<P, T, E, Accumulator<P, T, E>>>,
}

impl<P, T, E> AccumulatingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Pool with `concurrency` workers and default settings
    pub fn new(concurrency: usize) -> PoolResult<Self> {
        PoolBuilder::new(concurrency).accumulating()
    }

    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        PoolBuilder::from_config(config).accumulating()
    }

    pub(crate) fn build(config: PoolConfig, logger: Arc<dyn PoolLogger>) -> PoolResult<Self> {
        let delivery = Accumulator {
            results: Mutex::new(Vec::new()),
        };
        Ok(Self {
            engine: Engine::new(config, logger, delivery)?,
        })
    }

    /// Queue a job; fails once the pool is shut down
    pub fn submit(&self, job: Job<P, T, E>) -> PoolResult<()> {
        self.engine.submit_with(job, |_| ())
    }

    /// Queue jobs in order, stopping at the first error
    pub fn submit_all(&self, jobs: impl IntoIterator<Item = Job<P, T, E>>) -> PoolResult<()> {
        jobs.into_iter().try_for_each(|job| self.submit(job))
    }

    /// Remove and return every outcome collected so far
    pub fn take_results(&self) -> Vec<Outcome<P, T, E>> {
        std::mem::take(&mut *self.engine.delivery().results.lock())
    }

    /// Number of outcomes collected so far
    pub fn result_count(&self) -> usize {
        self.engine.delivery().results.lock().len()
    }

    pool_controls!();
}

impl<P, T, E> AccumulatingPool<P, T, E>
where
    P: JobProperties,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Copy of every outcome collected so far, in completion order
    pub fn results(&self) -> Vec<Outcome<P, T, E>> {
        self.engine.delivery().results.lock().clone()
    }
}

impl<P, T, E> Drop for AccumulatingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    fn drop(&mut self) {
        self.engine.close();
    }
}
