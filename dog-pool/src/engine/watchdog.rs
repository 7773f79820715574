use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::error;

use crate::observability::PoolLogger;
use crate::types::{JobContext, JobProperties};

/// Message reported for a job still running after each interval
pub const WATCHDOG_MESSAGE: &str = "Job is taking longer than expected";

/// Periodic reporter for long-running jobs.
///
/// Purely observational: it never touches the job it watches.
#[derive(Clone)]
pub(crate) struct Watchdog {
    logger: Arc<dyn PoolLogger>,
    interval: Duration,
}

impl Watchdog {
    pub(crate) fn new(logger: Arc<dyn PoolLogger>, interval: Duration) -> Self {
        Self { logger, interval }
    }

    /// Drive `job` to completion, reporting once per elapsed interval
    pub(crate) async fn watch<F, P>(&self, job: F, ctx: &JobContext<P>) -> F::Output
    where
        F: Future,
        P: JobProperties,
    {
        tokio::pin!(job);

        let started = Instant::now();
        let mut ticker = interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                output = &mut job => return output,
                _ = ticker.tick() => self.report(started, ctx),
            }
        }
    }

    /// Hand one report to the logger, containing any panic it raises
    fn report<P: JobProperties>(&self, started: Instant, ctx: &JobContext<P>) {
        let minutes = started.elapsed().as_secs() / 60;
        let data = [json!({ "minutes": minutes }), ctx.to_log_value()];

        let logged = panic::catch_unwind(AssertUnwindSafe(|| {
            self.logger.warn(WATCHDOG_MESSAGE, &data)
        }));
        if logged.is_err() {
            error!(worker_id = %ctx.worker_id, "watchdog logger panicked; report dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkerId;
    use parking_lot::Mutex;
    use serde_json::Value;

    type Reports = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

    fn recording_watchdog(interval: Duration) -> (Watchdog, Reports) {
        let reports: Reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let logger = move |message: &str, data: &[Value]| {
            sink.lock().push((message.to_string(), data.to_vec()));
        };
        (Watchdog::new(Arc::new(logger), interval), reports)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_job_is_never_reported() {
        let (watchdog, reports) = recording_watchdog(Duration::from_secs(60));
        let ctx = JobContext::new(WorkerId(1), ());

        let output = watchdog
            .watch(
                async {
                    tokio::time::sleep(Duration::from_secs(59)).await;
                    7
                },
                &ctx,
            )
            .await;

        assert_eq!(output, 7);
        assert!(reports.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_every_interval_with_elapsed_minutes() {
        let (watchdog, reports) = recording_watchdog(Duration::from_secs(60));
        let ctx = JobContext::new(WorkerId(2), json!({ "file": "a.txt" }));

        watchdog
            .watch(tokio::time::sleep(Duration::from_secs(150)), &ctx)
            .await;

        let reports = reports.lock();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].0, WATCHDOG_MESSAGE);
        assert_eq!(reports[0].1[0], json!({ "minutes": 1 }));
        assert_eq!(reports[1].1[0], json!({ "minutes": 2 }));
        assert_eq!(reports[1].1[1], json!({ "workerId": 2, "file": "a.txt" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_logger_does_not_abort_the_job() {
        let logger = |_message: &str, _data: &[Value]| panic!("logger failure");
        let watchdog = Watchdog::new(Arc::new(logger), Duration::from_secs(1));
        let ctx = JobContext::new(WorkerId(1), ());

        let output = watchdog
            .watch(
                async {
                    tokio::time::sleep(Duration::from_millis(2_500)).await;
                    "finished"
                },
                &ctx,
            )
            .await;

        assert_eq!(output, "finished");
    }
}
