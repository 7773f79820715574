use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::types::{JobKey, WorkerId};

/// Lifecycle events published by a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// Job was appended to the queue
    Submitted {
        job_key: JobKey,
        at: DateTime<Utc>,
    },

    /// A worker picked the job up
    Started {
        job_key: JobKey,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    /// Job produced a value
    Fulfilled {
        job_key: JobKey,
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    /// Job returned an error or panicked
    Rejected {
        job_key: JobKey,
        worker_id: WorkerId,
        panicked: bool,
        at: DateTime<Utc>,
    },

    /// Nothing queued, nothing running
    Idle {
        at: DateTime<Utc>,
    },

    /// Shutdown finished: every worker has terminated
    Drained {
        at: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Started { .. } => "started",
            Self::Fulfilled { .. } => "fulfilled",
            Self::Rejected { .. } => "rejected",
            Self::Idle { .. } => "idle",
            Self::Drained { .. } => "drained",
        }
    }

    /// Job key for per-job events
    pub fn job_key(&self) -> Option<JobKey> {
        match self {
            Self::Submitted { job_key, .. }
            | Self::Started { job_key, .. }
            | Self::Fulfilled { job_key, .. }
            | Self::Rejected { job_key, .. } => Some(*job_key),
            Self::Idle { .. } | Self::Drained { .. } => None,
        }
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::Submitted { at, .. }
            | Self::Started { at, .. }
            | Self::Fulfilled { at, .. }
            | Self::Rejected { at, .. }
            | Self::Idle { at }
            | Self::Drained { at } => at,
        }
    }
}

/// Broadcast fan-out for [`PoolEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; dropped silently when nobody listens
    pub fn emit(&self, event: PoolEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> BroadcastStream<PoolEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
