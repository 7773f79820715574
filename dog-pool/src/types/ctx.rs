use serde::Serialize;
use serde_json::{json, Value};

use super::WorkerId;

/// Bound for caller-defined job properties.
///
/// Properties travel through the pool untouched; `Serialize` lets the
/// watchdog report them as structured data.
pub trait JobProperties: Serialize + Clone + Send + Sync + 'static {}

impl<T> JobProperties for T where T: Serialize + Clone + Send + Sync + 'static {}

/// Execution context handed to a job, built fresh for every run
#[derive(Debug, Clone, Serialize)]
pub struct JobContext<P> {
    /// Worker running this job
    #[serde(rename = "workerId")]
    pub worker_id: WorkerId,

    /// The job's own properties
    pub properties: P,
}

impl<P: Serialize> JobContext<P> {
    pub fn new(worker_id: WorkerId, properties: P) -> Self {
        Self {
            worker_id,
            properties,
        }
    }

    /// Render as `{"workerId": n, ...properties}`.
    ///
    /// Properties that do not serialize to a JSON object are nested under
    /// `"properties"` instead of being merged.
    pub fn to_log_value(&self) -> Value {
        let properties = serde_json::to_value(&self.properties).unwrap_or(Value::Null);
        match properties {
            Value::Object(mut map) => {
                map.insert("workerId".to_string(), json!(self.worker_id.get()));
                Value::Object(map)
            }
            Value::Null => json!({ "workerId": self.worker_id.get() }),
            other => json!({ "workerId": self.worker_id.get(), "properties": other }),
        }
    }
}
