use std::fmt;

use thiserror::Error;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Usage and configuration errors raised by the pool itself.
///
/// Job failures never show up here; they are reported through
/// [`Outcome::Rejected`](crate::Outcome::Rejected).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool has been shut down")]
    ShutDown,

    #[error("Invalid concurrency: {0} (must be a positive integer)")]
    InvalidConcurrency(usize),

    #[error("No Tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Job outcome was abandoned before delivery")]
    Abandoned,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PoolError {
    /// Check if this error was caused by submitting to a shut down pool
    pub fn is_shut_down(&self) -> bool {
        matches!(self, Self::ShutDown)
    }
}

/// Why a job did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure<E> {
    /// The job returned an error; kept exactly as the job produced it
    Error(E),

    /// The job body panicked
    Panicked(String),
}

impl<E> JobFailure<E> {
    /// The job's own error value, if it returned one
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Error(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }

    /// Consume into the job's own error value, if it returned one
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Error(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Render a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

impl<E: fmt::Display> fmt::Display for JobFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "{}", err),
            Self::Panicked(msg) => write!(f, "job panicked: {}", msg),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for JobFailure<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_rendering() {
        let failure: JobFailure<String> = JobFailure::from_panic(Box::new("boom"));
        assert_eq!(failure, JobFailure::Panicked("boom".to_string()));

        let failure: JobFailure<String> =
            JobFailure::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(failure.to_string(), "job panicked: owned boom");

        let failure: JobFailure<String> = JobFailure::from_panic(Box::new(42_u32));
        assert!(failure.is_panic());
        assert!(failure.error().is_none());
    }

    #[test]
    fn test_error_is_preserved() {
        let failure = JobFailure::Error("disk full".to_string());
        assert_eq!(failure.error(), Some(&"disk full".to_string()));
        assert_eq!(failure.to_string(), "disk full");
        assert_eq!(failure.into_error(), Some("disk full".to_string()));
    }

    #[test]
    fn test_pool_error_messages() {
        assert_eq!(PoolError::ShutDown.to_string(), "Pool has been shut down");
        assert!(PoolError::ShutDown.is_shut_down());
        assert!(PoolError::InvalidConcurrency(0).to_string().contains("Invalid concurrency: 0"));
    }
}
