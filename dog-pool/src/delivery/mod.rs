//! Result-delivery strategies layered over the shared engine.
//!
//! Each pool flavor differs only in what happens to an [`Outcome`] once a
//! worker produces it: appended to a list, resolved into a per-job future,
//! or handed to a caller's callback.

pub mod accumulate;
pub mod promise;
pub mod streaming;

use async_trait::async_trait;

use crate::types::{JobKey, Outcome};

pub use accumulate::AccumulatingPool;
pub use promise::{JobHandle, PromisePool};
pub use streaming::{OutcomeHandler, OutcomeStream, StreamingPool};

/// Policy for handing a finished job's outcome to the consumer
#[async_trait]
pub(crate) trait Delivery<P, T, E>: Send + Sync + 'static
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn deliver(&self, key: JobKey, outcome: Outcome<P, T, E>);

    /// Every worker has exited; no further outcome will be delivered
    fn drained(&self) {}
}
