//! Pluggable latency, queue-position, and fee models.

pub mod fee;
pub mod latency;
pub mod queue;

pub use fee::{CommonFees, FeeModel};
pub use latency::LatencyModel;
pub use queue::QueueModel;
