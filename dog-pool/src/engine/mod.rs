//! Shared execution engine behind every pool flavor.
//!
//! The engine owns the queue, a fixed set of worker loops, the active-job
//! counter, idle and drain waiters, and the accepting flag. All of that lives
//! behind one `parking_lot::Mutex` that is never held across an `.await`, so
//! each operation below is atomic with respect to the others.

pub(crate) mod signal;
pub(crate) mod watchdog;
pub(crate) mod worker;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::delivery::Delivery;
use crate::job::Job;
use crate::observability::{EventBus, MetricsSnapshot, PoolEvent, PoolLogger, PoolMetrics};
use crate::types::{JobKey, JobProperties, PoolId, WorkerId};
use crate::{PoolError, PoolResult};

use signal::WorkSignal;
use watchdog::Watchdog;

pub use watchdog::WATCHDOG_MESSAGE;

/// A job waiting in the queue together with its key
pub(crate) struct QueuedJob<P, T, E> {
    pub(crate) key: JobKey,
    pub(crate) job: Job<P, T, E>,
}

/// What a worker should do next
pub(crate) enum Next<P, T, E> {
    Run(QueuedJob<P, T, E>),
    Wait(signal::WorkWait),
    Exit,
}

struct EngineState<P, T, E> {
    queue: VecDeque<QueuedJob<P, T, E>>,
    active: usize,
    accepting: bool,
    started: bool,
    live_workers: usize,
    next_key: u64,
    idle_waiters: Vec<oneshot::Sender<()>>,
    drain_waiters: Vec<oneshot::Sender<()>>,
}

impl<P, T, E> EngineState<P, T, E> {
    fn is_idle(&self) -> bool {
        self.active == 0 && self.queue.is_empty()
    }
}

pub(crate) struct Engine<P, T, E, D> {
    id: PoolId,
    config: PoolConfig,
    state: Mutex<EngineState<P, T, E>>,
    signal: WorkSignal,
    watchdog: Watchdog,
    delivery: D,
    metrics: PoolMetrics,
    events: EventBus,
}

impl<P, T, E, D> Engine<P, T, E, D>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
    D: Delivery<P, T, E>,
{
    /// Validate the configuration and build an engine with no workers yet
    pub(crate) fn new(
        config: PoolConfig,
        logger: Arc<dyn PoolLogger>,
        delivery: D,
    ) -> PoolResult<Arc<Self>> {
        config.validate()?;

        Ok(Arc::new(Self {
            id: PoolId::new(),
            watchdog: Watchdog::new(logger, config.watchdog_interval),
            events: EventBus::new(config.event_capacity),
            state: Mutex::new(EngineState {
                queue: VecDeque::new(),
                active: 0,
                accepting: true,
                started: false,
                live_workers: 0,
                next_key: 1,
                idle_waiters: Vec::new(),
                drain_waiters: Vec::new(),
            }),
            signal: WorkSignal::new(),
            metrics: PoolMetrics::new(),
            config,
            delivery,
        }))
    }

    pub(crate) fn id(&self) -> &PoolId {
        &self.id
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Enqueue a job.
    ///
    /// `register` runs under the state lock with the freshly allocated key,
    /// before any worker can see the job.
    pub(crate) fn submit_with<R>(
        self: &Arc<Self>,
        job: Job<P, T, E>,
        register: impl FnOnce(JobKey) -> R,
    ) -> PoolResult<R> {
        let mut state = self.state.lock();

        if !state.accepting {
            return Err(PoolError::ShutDown);
        }
        if !state.started {
            self.start_workers(&mut state)?;
        }

        let key = JobKey(state.next_key);
        state.next_key += 1;

        let registered = register(key);
        state.queue.push_back(QueuedJob { key, job });
        let queued = state.queue.len();

        self.metrics.increment_jobs_submitted();
        self.events.emit(PoolEvent::Submitted { job_key: key, at: Utc::now() });
        self.signal.notify();
        drop(state);

        debug!(pool_id = %self.id, job_key = %key, queued, "job submitted");
        Ok(registered)
    }

    /// Spawn the fixed worker set on the current Tokio runtime
    fn start_workers(self: &Arc<Self>, state: &mut EngineState<P, T, E>) -> PoolResult<()> {
        let runtime = Handle::try_current().map_err(|e| PoolError::NoRuntime(e.to_string()))?;

        for id in 1..=self.config.concurrency {
            runtime.spawn(worker::run(self.clone(), WorkerId(id)));
        }
        state.started = true;
        state.live_workers = self.config.concurrency;

        info!(pool_id = %self.id, workers = self.config.concurrency, "worker pool started");
        Ok(())
    }

    /// Dequeue for a worker, or tell it to wait or exit
    pub(crate) fn next_job(&self) -> Next<P, T, E> {
        let mut state = self.state.lock();

        if let Some(queued) = state.queue.pop_front() {
            state.active += 1;
            return Next::Run(queued);
        }
        if !state.accepting {
            return Next::Exit;
        }
        Next::Wait(self.signal.arm())
    }

    /// Bookkeeping after a job's outcome has been delivered
    pub(crate) fn finish_job(&self) {
        let mut state = self.state.lock();
        state.active -= 1;

        if state.is_idle() {
            for waiter in state.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
            self.events.emit(PoolEvent::Idle { at: Utc::now() });
        }
    }

    /// Called exactly once per worker when its loop ends, even on panic
    pub(crate) fn worker_exited(&self, worker_id: WorkerId) {
        let waiters = {
            let mut state = self.state.lock();
            state.live_workers -= 1;
            debug!(
                pool_id = %self.id,
                worker_id = %worker_id,
                remaining = state.live_workers,
                "worker terminated"
            );

            if state.live_workers > 0 {
                return;
            }
            std::mem::take(&mut state.drain_waiters)
        };

        self.drained();
        for waiter in waiters {
            let _ = waiter.send(());
        }
        info!(pool_id = %self.id, "worker pool drained");
    }

    /// Release the delivery side and announce the drain, outside the lock
    fn drained(&self) {
        self.delivery.drained();
        self.events.emit(PoolEvent::Drained { at: Utc::now() });
    }

    /// Resolve once nothing is queued and nothing is running
    pub(crate) async fn wait_for_idle(&self) {
        let waiter = {
            let mut state = self.state.lock();
            if state.is_idle() {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.idle_waiters.push(tx);
            rx
        };

        let _ = waiter.await;
    }

    /// Stop accepting work, let queued and running jobs finish, and wait
    /// for every worker to terminate
    pub(crate) async fn shutdown(&self) {
        let waiter = {
            let mut state = self.state.lock();
            let first_call = self.stop_accepting(&mut state);

            if state.live_workers == 0 {
                // Never started, or already drained
                (None, first_call && !state.started)
            } else {
                let (tx, rx) = oneshot::channel();
                state.drain_waiters.push(tx);
                (Some(rx), false)
            }
        };

        match waiter {
            (Some(waiter), _) => {
                let _ = waiter.await;
            }
            (None, true) => self.drained(),
            (None, false) => {}
        }
    }

    /// Stop accepting work without waiting; workers drain in the background
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        self.stop_accepting(&mut state);
    }

    fn stop_accepting(&self, state: &mut EngineState<P, T, E>) -> bool {
        let first_call = state.accepting;
        if first_call {
            state.accepting = false;
            info!(
                pool_id = %self.id,
                queued = state.queue.len(),
                active = state.active,
                "pool shutting down"
            );
        }
        self.signal.notify();
        first_call
    }

    pub(crate) fn queue_length(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub(crate) fn active_job_count(&self) -> usize {
        self.state.lock().active
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        !self.state.lock().accepting
    }

    pub(crate) fn metrics(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        self.metrics.snapshot(state.queue.len(), state.active)
    }

    pub(crate) fn counters(&self) -> &PoolMetrics {
        &self.metrics
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub(crate) fn subscribe(&self) -> BroadcastStream<PoolEvent> {
        self.events.subscribe()
    }
}

/// Shared control surface generated into every pool flavor
macro_rules! pool_controls {
    () => {
        /// Unique identifier of this pool instance
        pub fn id(&self) -> &$crate::types::PoolId {
            self.engine.id()
        }

        /// Fixed number of workers
        pub fn concurrency(&self) -> usize {
            self.engine.config().concurrency
        }

        /// Resolve once nothing is queued and nothing is running.
        ///
        /// Resolves immediately when already idle. A call made while busy
        /// resolves at the next transition into idle, once.
        pub async fn wait_for_idle(&self) {
            self.engine.wait_for_idle().await
        }

        /// Stop accepting jobs, run everything already submitted, and wait
        /// until every worker has terminated. Safe to call repeatedly.
        pub async fn shutdown(&self) {
            self.engine.shutdown().await
        }

        /// Jobs waiting to start (advisory)
        pub fn queue_length(&self) -> usize {
            self.engine.queue_length()
        }

        /// Jobs currently executing (advisory)
        pub fn active_job_count(&self) -> usize {
            self.engine.active_job_count()
        }

        pub fn is_shut_down(&self) -> bool {
            self.engine.is_shut_down()
        }

        pub fn metrics(&self) -> $crate::observability::MetricsSnapshot {
            self.engine.metrics()
        }

        /// Subscribe to lifecycle events from now on
        pub fn subscribe(
            &self,
        ) -> tokio_stream::wrappers::BroadcastStream<$crate::observability::PoolEvent> {
            self.engine.subscribe()
        }
    };
}

pub(crate) use pool_controls;
