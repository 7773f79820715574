use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::JobFailure;
use crate::types::{JobContext, JobProperties};

/// Executable half of a job.
///
/// The pool only assumes a task produces a value or fails. Properties live
/// next to the task on [`Job`], not inside it.
#[async_trait]
pub trait Task<P, T, E>: Send + Sync + 'static
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn execute(&self, ctx: JobContext<P>) -> Result<T, E>;
}

/// Adapter that lets an async closure act as a [`Task`]
struct FnTask<F> {
    f: F,
}

#[async_trait]
impl<P, T, E, F, Fut> Task<P, T, E> for FnTask<F>
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(JobContext<P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    async fn execute(&self, ctx: JobContext<P>) -> Result<T, E> {
        (self.f)(ctx).await
    }
}

/// A unit of work: a task plus the caller's properties
pub struct Job<P, T, E> {
    properties: P,
    task: Arc<dyn Task<P, T, E>>,
}

impl<P, T, E> Job<P, T, E>
where
    P: JobProperties,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a job from any [`Task`] implementation
    pub fn new(properties: P, task: impl Task<P, T, E>) -> Self {
        Self {
            properties,
            task: Arc::new(task),
        }
    }

    /// Create a job from an async closure
    ///
    /// ```rust
    /// use dog_pool::Job;
    ///
    /// let job: Job<&str, u32, String> = Job::from_fn("resize", |ctx| async move {
    ///     Ok(ctx.worker_id.get() as u32)
    /// });
    /// assert_eq!(job.properties(), &"resize");
    /// ```
    pub fn from_fn<F, Fut>(properties: P, f: F) -> Self
    where
        F: Fn(JobContext<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(properties, FnTask { f })
    }

    /// Share one task between many jobs
    pub fn with_shared_task(properties: P, task: Arc<dyn Task<P, T, E>>) -> Self {
        Self { properties, task }
    }

    pub fn properties(&self) -> &P {
        &self.properties
    }

    pub(crate) fn into_properties(self) -> P {
        self.properties
    }

    /// Run the task under `ctx`, containing errors and panics
    pub(crate) async fn run(&self, ctx: JobContext<P>) -> Result<T, JobFailure<E>> {
        match AssertUnwindSafe(self.task.execute(ctx)).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(JobFailure::Error(err)),
            Err(payload) => Err(JobFailure::from_panic(payload)),
        }
    }
}

impl<P: Clone, T, E> Clone for Job<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            task: self.task.clone(),
        }
    }
}

impl<P: fmt::Debug, T, E> fmt::Debug for Job<P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
