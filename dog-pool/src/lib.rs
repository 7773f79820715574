//! # dog-pool: Bounded-Concurrency Async Job Pool
//!
//! **Run async jobs with a fixed worker count, then know exactly when they are done**
//!
//! dog-pool keeps an in-process queue in front of a fixed set of Tokio worker
//! tasks. Every job runs to an [`Outcome`] (fulfilled or rejected), failures
//! never stop other jobs, and the pool reports idleness and drains gracefully.
//!
//! ## 🎯 Features
//!
//! - **Hard concurrency cap**: never more than `concurrency` jobs in flight
//! - **Idle detection**: [`wait_for_idle`](PromisePool::wait_for_idle) resolves once
//!   queue and workers are empty
//! - **Graceful shutdown**: stop accepting, finish everything submitted, wait for every worker
//! - **Watchdog**: jobs running past the watchdog interval are reported, not cancelled
//! - **Four delivery flavors**: accumulate, per-job handles, streaming callback, one-shot batch
//! - **Structured observability**: `tracing` spans, lifecycle event streams, live counters
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use dog_pool::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> PoolResult<()> {
//! let pool: PromisePool<u32, u32, String> = PromisePool::new(2)?;
//!
//! let handles = pool.submit_all((1..=5).map(|n| {
//!     Job::from_fn(n, |ctx| async move { Ok(ctx.properties * 10) })
//! }))?;
//!
//! for handle in handles {
//!     let outcome = handle.await?;
//!     assert_eq!(*outcome.value().unwrap(), outcome.properties() * 10);
//! }
//!
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod job;
pub(crate) mod engine;
pub mod delivery;
pub mod batch;
pub mod builder;
pub mod observability;

pub use types::{JobContext, JobKey, JobProperties, Outcome, PoolId, WorkerId};
pub use error::{JobFailure, PoolError, PoolResult};
pub use config::PoolConfig;
pub use job::{Job, Task};
pub use engine::WATCHDOG_MESSAGE;
pub use delivery::{
    AccumulatingPool, JobHandle, OutcomeHandler, OutcomeStream, PromisePool, StreamingPool,
};
pub use batch::{run_batch, BatchRunner};
pub use builder::PoolBuilder;

// Observability exports
pub use observability::{MetricsSnapshot, PoolEvent, PoolLogger, TracingLogger};

#[cfg(feature = "tracing-basic")]
pub use observability::init_tracing;

/// Everything needed to build jobs and run them through a pool
pub mod prelude {
    pub use crate::{
        AccumulatingPool, BatchRunner, PoolBuilder, PromisePool, StreamingPool,
    };

    pub use crate::{
        Job, JobContext, JobFailure, JobHandle, Outcome, PoolConfig, PoolError, PoolResult, Task,
    };

    pub use crate::run_batch;

    pub use async_trait::async_trait;
}
