use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, instrument};

use super::{Engine, Next, QueuedJob};
use crate::delivery::Delivery;
use crate::observability::PoolEvent;
use crate::types::{JobContext, JobProperties, Outcome, WorkerId};

/// Reports the worker's exit to the engine when dropped, so the drain
/// count stays right even if the loop unwinds
struct ExitGuard<P, T, E, D>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
    D: Delivery<P, T, E>,
{
    engine: Arc<Engine<P, T, E, D>>,
    worker_id: WorkerId,
}

impl<P, T, E, D> Drop for ExitGuard<P, T, E, D>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
    D: Delivery<P, T, E>,
{
    fn drop(&mut self) {
        self.engine.worker_exited(self.worker_id);
    }
}

/// Worker loop: take one job at a time until shut down and drained
#[instrument(skip(engine), fields(pool_id = %engine.id()))]
pub(crate) async fn run<P, T, E, D>(engine: Arc<Engine<P, T, E, D>>, worker_id: WorkerId)
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
    D: Delivery<P, T, E>,
{
    let _exit = ExitGuard {
        engine: engine.clone(),
        worker_id,
    };
    debug!("worker started");

    loop {
        match engine.next_job() {
            Next::Run(queued) => execute(&engine, worker_id, queued).await,
            Next::Wait(wait) => {
                let _ = wait.await;
            }
            Next::Exit => break,
        }
    }
}

/// Run one dequeued job and hand its outcome to the delivery strategy
async fn execute<P, T, E, D>(
    engine: &Engine<P, T, E, D>,
    worker_id: WorkerId,
    queued: QueuedJob<P, T, E>,
)
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
    D: Delivery<P, T, E>,
{
    let QueuedJob { key, job } = queued;

    engine.counters().increment_jobs_started();
    engine.events().emit(PoolEvent::Started {
        job_key: key,
        worker_id,
        at: Utc::now(),
    });
    debug!(job_key = %key, "job started");

    let ctx = JobContext::new(worker_id, job.properties().clone());
    let result = engine.watchdog().watch(job.run(ctx.clone()), &ctx).await;
    let outcome = Outcome::from_result(result, job.into_properties());

    match outcome.reason() {
        None => {
            engine.counters().increment_jobs_fulfilled();
            engine.events().emit(PoolEvent::Fulfilled {
                job_key: key,
                worker_id,
                at: Utc::now(),
            });
        }
        Some(reason) => {
            engine.counters().increment_jobs_rejected();
            engine.events().emit(PoolEvent::Rejected {
                job_key: key,
                worker_id,
                panicked: reason.is_panic(),
                at: Utc::now(),
            });
        }
    }
    debug!(job_key = %key, status = outcome.status(), "job finished");

    if AssertUnwindSafe(engine.delivery().deliver(key, outcome))
        .catch_unwind()
        .await
        .is_err()
    {
        error!(job_key = %key, "outcome delivery panicked; outcome dropped");
    }

    engine.finish_job();
}
