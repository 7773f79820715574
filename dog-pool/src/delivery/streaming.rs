use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::Delivery;
use crate::builder::PoolBuilder;
use crate::engine::{pool_controls, Engine};
use crate::job::Job;
use crate::observability::PoolLogger;
use crate::types::{JobKey, JobProperties, Outcome};
use crate::{PoolConfig, PoolResult};

/// Stream of outcomes in completion order, see [`StreamingPool::with_stream`]
pub type OutcomeStream<P, T, E> = UnboundedReceiverStream<Outcome<P, T, E>>;

/// Consumer callback for [`StreamingPool`].
///
/// Async closures `Fn(Outcome) -> impl Future<Output = ()>` implement this
/// through [`StreamingPool::from_fn`].
#[async_trait]
pub trait OutcomeHandler<P, T, E>: Send + Sync + 'static
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn handle(&self, outcome: Outcome<P, T, E>);
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<P, T, E, F, Fut> OutcomeHandler<P, T, E> for FnHandler<F>
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(Outcome<P, T, E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, outcome: Outcome<P, T, E>) {
        (self.f)(outcome).await
    }
}

struct ChannelHandler<P, T, E> {
    sender: mpsc::UnboundedSender<Outcome<P, T, E>>,
}

#[async_trait]
impl<P, T, E> OutcomeHandler<P, T, E> for ChannelHandler<P, T, E>
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn handle(&self, outcome: Outcome<P, T, E>) {
        // A dropped stream means the consumer stopped listening.
        let _ = self.sender.send(outcome);
    }
}

/// Forwards each outcome to the handler and keeps nothing.
///
/// The handler is released once the pool drains, which closes an
/// [`OutcomeStream`] even while the pool itself is still alive.
pub(crate) struct Streamer<P, T, E> {
    handler: Mutex<Option<Arc<dyn OutcomeHandler<P, T, E>>>>,
}

#[async_trait]
impl<P, T, E> Delivery<P, T, E> for Streamer<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn deliver(&self, _key: JobKey, outcome: Outcome<P, T, E>) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler.handle(outcome).await;
        }
    }

    fn drained(&self) {
        let handler = self.handler.lock().take();
        drop(handler);
    }
}

/// Pool that hands every outcome to a callback as soon as it is produced.
///
/// The handler runs on the worker that produced the outcome, so a slow
/// handler holds that worker's slot until it returns.
pub struct StreamingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    engine: Arc<Engine<P, T, E, Streamer<P, T, E>>>,
}

impl<P, T, E> StreamingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Pool with `concurrency` workers feeding `handler`
    pub fn new(concurrency: usize, handler: impl OutcomeHandler<P, T, E>) -> PoolResult<Self> {
        PoolBuilder::new(concurrency).streaming(handler)
    }

    /// Pool with `concurrency` workers feeding an async closure
    pub fn from_fn<F, Fut>(concurrency: usize, f: F) -> PoolResult<Self>
    where
        F: Fn(Outcome<P, T, E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(concurrency, FnHandler { f })
    }

    /// Pool whose outcomes arrive on a stream.
    ///
    /// The stream ends as soon as the pool has drained: after
    /// [`shutdown`](Self::shutdown) returns, or once every worker has exited
    /// following a drop.
    ///
    /// ```rust
    /// use dog_pool::{Job, PoolConfig, StreamingPool};
    /// use tokio_stream::StreamExt;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> dog_pool::PoolResult<()> {
    /// let (pool, mut outcomes) = StreamingPool::with_stream(PoolConfig::new(2))?;
    /// pool.submit(Job::from_fn(1_u8, |_ctx| async { Ok::<_, String>(()) }))?;
    /// pool.shutdown().await;
    ///
    /// let first = outcomes.next().await.unwrap();
    /// assert!(first.is_fulfilled());
    /// assert!(outcomes.next().await.is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_stream(config: PoolConfig) -> PoolResult<(Self, OutcomeStream<P, T, E>)> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pool = PoolBuilder::from_config(config).streaming(ChannelHandler { sender })?;
        Ok((pool, UnboundedReceiverStream::new(receiver)))
    }

    pub(crate) fn build(
        config: PoolConfig,
        logger: Arc<dyn PoolLogger>,
        handler: Box<dyn OutcomeHandler<P, T, E>>,
    ) -> PoolResult<Self> {
        Ok(Self {
            engine: Engine::new(
                config,
                logger,
                Streamer {
                    handler: Mutex::new(Some(Arc::from(handler))),
                },
            )?,
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

    pool_controls!();
}

impl<P, T, E> Drop for StreamingPool<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    fn drop(&mut self) {
        self.engine.close();
    }
}
