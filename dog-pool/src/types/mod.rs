pub mod ids;
pub mod ctx;
pub mod outcome;

pub use ids::{PoolId, WorkerId, JobKey};
pub use ctx::{JobContext, JobProperties};
pub use outcome::Outcome;
