//! One-shot runner for a closed list of jobs.
//!
//! No queue and no background tasks: `min(concurrency, jobs.len())` worker
//! futures run on the caller's task and claim job indexes from a shared
//! cursor until the list is exhausted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::builder::PoolBuilder;
use crate::engine::watchdog::Watchdog;
use crate::job::Job;
use crate::observability::PoolLogger;
use crate::types::{JobContext, JobProperties, Outcome, WorkerId};
use crate::{PoolConfig, PoolResult};

/// Runs a fixed batch with bounded concurrency, outcomes in input order
#[derive(Clone)]
pub struct BatchRunner {
    config: PoolConfig,
    logger: Arc<dyn PoolLogger>,
}

impl BatchRunner {
    /// Fails with [`PoolError::InvalidConcurrency`](crate::PoolError::InvalidConcurrency)
    /// when `concurrency` is zero
    pub fn new(concurrency: usize) -> PoolResult<Self> {
        PoolBuilder::new(concurrency).batch()
    }

    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        PoolBuilder::from_config(config).batch()
    }

    pub(crate) fn build(config: PoolConfig, logger: Arc<dyn PoolLogger>) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self { config, logger })
    }

    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Run every job and return one outcome per job, in input order
    pub async fn run<P, T, E>(&self, jobs: Vec<Job<P, T, E>>) -> Vec<Outcome<P, T, E>>
    where
        P: JobProperties,
        T: Send + 'static,
        E: Send + 'static,
    {
        let total = jobs.len();
        let workers = self.config.concurrency.min(total);
        let cursor = AtomicUsize::new(0);
        let watchdog = Watchdog::new(self.logger.clone(), self.config.watchdog_interval);

        debug!(jobs = total, workers, "running batch");

        let worker = |worker_id: WorkerId| {
            let jobs = &jobs;
            let cursor = &cursor;
            let watchdog = &watchdog;

            async move {
                let mut finished = Vec::new();
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(job) = jobs.get(index) else {
                        break;
                    };

                    let ctx = JobContext::new(worker_id, job.properties().clone());
                    let result = watchdog.watch(job.run(ctx.clone()), &ctx).await;
                    finished.push((index, Outcome::from_result(result, ctx.properties)));
                }
                finished
            }
        };

        let mut indexed: Vec<_> = join_all((1..=workers).map(|id| worker(WorkerId(id))))
            .await
            .into_iter()
            .flatten()
            .collect();
        indexed.sort_unstable_by_key(|(index, _)| *index);

        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Run `jobs` with at most `concurrency` in flight and default settings.
///
/// Zero concurrency is rejected before any job runs.
///
/// ```rust
/// use dog_pool::{run_batch, Job};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> dog_pool::PoolResult<()> {
/// let jobs: Vec<Job<(), &str, String>> = ["result1", "result2", "result3"]
///     .into_iter()
///     .map(|value| Job::from_fn((), move |_ctx| async move { Ok(value) }))
///     .collect();
///
/// let outcomes = run_batch(jobs, 2).await?;
/// let values: Vec<_> = outcomes.iter().filter_map(|o| o.value().copied()).collect();
/// assert_eq!(values, ["result1", "result2", "result3"]);
/// # Ok(())
/// # }
/// ```
pub async fn run_batch<P, T, E>(
    jobs: Vec<Job<P, T, E>>,
    concurrency: usize,
) -> PoolResult<Vec<Outcome<P, T, E>>>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    let runner = BatchRunner::new(concurrency)?;
    Ok(runner.run(jobs).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_zero_concurrency_runs_nothing() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let job: Job<(), (), String> = Job::from_fn((), move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let result = run_batch(vec![job], 0).await;

        assert!(matches!(result, Err(PoolError::InvalidConcurrency(0))));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_follow_input_order_not_completion() {
        let jobs: Vec<Job<u64, u64, String>> = [30, 10, 20]
            .into_iter()
            .map(|delay| {
                Job::from_fn(delay, |ctx| async move {
                    tokio::time::sleep(Duration::from_millis(ctx.properties)).await;
                    Ok(ctx.properties)
                })
            })
            .collect();

        let outcomes = run_batch(jobs, 3).await.unwrap();
        let values: Vec<_> = outcomes.iter().map(|o| *o.value().unwrap()).collect();
        assert_eq!(values, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_failures_are_captured_in_place() {
        let jobs: Vec<Job<usize, usize, String>> = (0..4)
            .map(|i| {
                Job::from_fn(i, |ctx| async move {
                    if ctx.properties % 2 == 1 {
                        Err(format!("odd {}", ctx.properties))
                    } else {
                        Ok(ctx.properties)
                    }
                })
            })
            .collect();

        let outcomes = BatchRunner::new(2).unwrap().run(jobs).await;

        assert_eq!(outcomes.len(), 4);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.properties(), &i);
            assert_eq!(outcome.is_rejected(), i % 2 == 1);
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcomes = run_batch(Vec::<Job<(), (), ()>>::new(), 4).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_workers_capped_by_job_count() {
        let seen_workers = Arc::new(parking_lot::Mutex::new(std::collections::HashSet::new()));
        let sink = seen_workers.clone();
        let jobs: Vec<Job<(), (), String>> = (0..2)
            .map(|_| {
                let sink = sink.clone();
                Job::from_fn((), move |ctx| {
                    let sink = sink.clone();
                    async move {
                        sink.lock().insert(ctx.worker_id.get());
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Ok(())
                    }
                })
            })
            .collect();

        BatchRunner::new(8).unwrap().run(jobs).await;

        let seen = seen_workers.lock();
        assert!(seen.iter().all(|id| (1..=2).contains(id)));
    }
}
