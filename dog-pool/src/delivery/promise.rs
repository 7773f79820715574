use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use pin_project::pin_project;
use tokio::sync::oneshot;

use super::Delivery;
use crate::builder::PoolBuilder;
use crate::engine::{pool_controls, Engine};
use crate::job::Job;
use crate::observability::PoolLogger;
use crate::types::{JobKey, JobProperties, Outcome};
use crate::{PoolConfig, PoolError, PoolResult};

/// Pending resolutions keyed by job key; an entry lives only until its
/// outcome is delivered
pub(crate) struct PromiseRegistry<P, T, E> {
    pending: Mutex<HashMap<JobKey, oneshot::Sender<Outcome<P, T, E>>>>,
}

impl<P, T, E> PromiseRegistry<P, T, E> {
    fn register(&self, key: JobKey) -> oneshot::Receiver<Outcome<P, T, E>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(key, tx);
        rx
    }
}

#[async_trait]
impl<P, T, E> Delivery<P, T, E> for PromiseRegistry<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn deliver(&self, key: JobKey, outcome: Outcome<P, T, E>) {
        let sender = self.pending.lock().remove(&key);
        if let Some(sender) = sender {
            // The caller may have dropped the handle; the outcome is simply discarded.
            let _ = sender.send(outcome);
        }
    }
}

/// Future resolving to one job's outcome
#[pin_project]
#[must_use = "a JobHandle does nothing unless awaited; dropping it does not cancel the job"]
pub struct JobHandle<P, T, E> {
    key: JobKey,
    #[pin]
    receiver: oneshot::Receiver<Outcome<P, T, E>>,
}

impl<P, T, E> JobHandle<P, T, E> {
    /// Key the pool assigned to this job
    pub fn key(&self) -> JobKey {
        self.key
    }
}

impl<P, T, E> Future for JobHandle<P, T, E> {
    type Output = PoolResult<Outcome<P, T, E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project()
            .receiver
            .poll(cx)
            .map(|received| received.map_err(|_| PoolError::Abandoned))
    }
}

/// Pool whose `submit` returns a future for that job's outcome.
///
/// ```rust
/// use dog_pool::{Job, PromisePool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> dog_pool::PoolResult<()> {
/// let pool = PromisePool::new(4)?;
/// let handle = pool.submit(Job::from_fn("ping", |_ctx| async { Ok::<_, String>("pong") }))?;
///
/// let outcome = handle.await?;
/// assert_eq!(outcome.value(), Some(&"pong"));
/// assert_eq!(outcome.properties(), &"ping");
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct PromisePool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    engine: Arc<Engine<P, T, E, PromiseRegistry<P, T, E>>>,
}

impl<P, T, E> PromisePool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Pool with `concurrency` workers and default settings
    pub fn new(concurrency: usize) -> PoolResult<Self> {
        PoolBuilder::new(concurrency).promise()
    }

    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        PoolBuilder::from_config(config).promise()
    }

    pub(crate) fn build(config: PoolConfig, logger: Arc<dyn PoolLogger>) -> PoolResult<Self> {
        let delivery = PromiseRegistry {
            pending: Mutex::new(HashMap::new()),
        };
        Ok(Self {
            engine: Engine::new(config, logger, delivery)?,
        })
    }

    /// Queue a job and get a handle that resolves with its outcome
    pub fn submit(&self, job: Job<P, T, E>) -> PoolResult<JobHandle<P, T, E>> {
        let registry = self.engine.delivery();
        self.engine.submit_with(job, |key| JobHandle {
            key,
            receiver: registry.register(key),
        })
    }

    /// Queue jobs in order, stopping at the first error
    pub fn submit_all(
        &self,
        jobs: impl IntoIterator<Item = Job<P, T, E>>,
    ) -> PoolResult<Vec<JobHandle<P, T, E>>> {
        jobs.into_iter().map(|job| self.submit(job)).collect()
    }

    /// Outcomes not yet delivered
    pub fn pending_count(&self) -> usize {
        self.engine.delivery().pending.lock().len()
    }

    pool_controls!();
}

impl<P, T, E> Drop for PromisePool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    fn drop(&mut self) {
        self.engine.close();
    }
}
