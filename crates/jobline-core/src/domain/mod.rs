//! Domain model: job identity and the capability a queued job must provide.

pub mod ids;
pub mod job;

pub use ids::JobId;
pub use job::{Job, Keyed};
