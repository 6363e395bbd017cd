//! jobline-core
//!
//! In-process ordered job queue: FIFO admission, bounded concurrency,
//! optional rate limiting, deduplication of job ids with a retention window
//! after completion, and backpressure on the pending queue.
//!
//! # Modules
//! - **domain**: job identity (`JobId`) and the `Job` capability
//! - **ports**: collaborators (`Clock`, `IdGenerator`, `JobLogger`)
//! - **handler**: the unit of work bound to a queue (`Handler`, `handler_fn`)
//! - **fn_job**: closures as jobs (`FnJob`, `RunFn`, `FnQueue`)
//! - **queue**: `JobQueue`, its config, builder and result bridge
//! - **observability**: `QueueStats`
//! - **error**: `ConfigError`, `QueueError`, `JobError`

pub mod domain;
pub mod error;
pub mod fn_job;
pub mod handler;
pub mod observability;
pub mod ports;
pub mod queue;

pub use domain::{Job, JobId, Keyed};
pub use error::{BoxError, ConfigError, JobError, QueueError};
pub use fn_job::{FnJob, FnQueue, RunFn};
pub use handler::{Handler, HandlerFn, handler_fn};
pub use observability::QueueStats;
pub use queue::{Completion, JobQueue, JobQueueBuilder, QueueConfig};
