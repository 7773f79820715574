use crate::error::JobFailure;

/// Result of running one job, always paired with the job's properties
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<P, T, E> {
    Fulfilled {
        value: T,
        properties: P,
    },
    Rejected {
        reason: JobFailure<E>,
        properties: P,
    },
}

impl<P, T, E> Outcome<P, T, E> {
    pub(crate) fn from_result(result: Result<T, JobFailure<E>>, properties: P) -> Self {
        match result {
            Ok(value) => Self::Fulfilled { value, properties },
            Err(reason) => Self::Rejected { reason, properties },
        }
    }

    /// Properties of the job that produced this outcome
    pub fn properties(&self) -> &P {
        match self {
            Self::Fulfilled { properties, .. } | Self::Rejected { properties, .. } => properties,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled { value, .. } => Some(value),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&JobFailure<E>> {
        match self {
            Self::Fulfilled { .. } => None,
            Self::Rejected { reason, .. } => Some(reason),
        }
    }

    /// Event name used in logs and lifecycle events
    pub fn status(&self) -> &'static str {
        match self {
            Self::Fulfilled { .. } => "fulfilled",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Split into a plain `Result` and the properties
    pub fn into_parts(self) -> (Result<T, JobFailure<E>>, P) {
        match self {
            Self::Fulfilled { value, properties } => (Ok(value), properties),
            Self::Rejected { reason, properties } => (Err(reason), properties),
        }
    }

    pub fn into_result(self) -> Result<T, JobFailure<E>> {
        self.into_parts().0
    }
}
