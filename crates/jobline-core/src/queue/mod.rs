//! Ordered job queue with bounded concurrency.
//!
//! # Flow
//! `submit` → admission guard → FIFO → dispatcher → handler task →
//! retention ledger / result bridge → dispatcher woken again.
//!
//! Four policies sit on the one FIFO, each optional:
//! - dedup of job ids (`unique_job_id`), optionally extended past completion (`retention_ms`)
//! - concurrency window (`max_concurrency`)
//! - dispatch spacing (`rate_limit_per_second`)
//! - backpressure (`max_queue_length`)

mod builder;
mod completion;
mod config;
mod dispatcher;
mod retention;
mod state;

pub use self::builder::JobQueueBuilder;
pub use self::completion::Completion;
pub use self::config::{MIN_RETENTION_MS, QueueConfig};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use self::dispatcher::Next;
use self::state::{Envelope, QueueState, Reply};
use crate::domain::{Job, JobId};
use crate::error::{ConfigError, JobError, QueueError};
use crate::handler::Handler;
use crate::observability::QueueStats;
use crate::ports::{IdGenerator, JobLogger, LogLevel};

/// State shared between the queue handle, the dispatcher and running jobs.
pub(crate) struct Shared<J: Job, H: Handler<J>> {
    config: QueueConfig,
    handler: H,
    logger: Arc<dyn JobLogger>,
    runtime: Handle,
    state: Mutex<QueueState<J, H::Output>>,
    wake: Notify,
}

impl<J: Job, H: Handler<J>> Shared<J, H> {
    /// The lock is never held across an await, and nothing under it panics
    /// on user input, so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, QueueState<J, H::Output>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next(&self) -> Next<J, H::Output> {
        let mut state = self.lock();
        if state.is_destroyed() {
            return Next::Stopped;
        }
        match state.take_next(self.config.max_concurrency) {
            Some(envelope) => Next::Dispatch(envelope),
            None => Next::Idle,
        }
    }

    /// Returns `false` if the queue was destroyed in the meantime.
    fn mark_dispatched(&self, id: &JobId) -> bool {
        let mut state = self.lock();
        if state.is_destroyed() {
            return false;
        }
        state.mark_dispatched(id);
        true
    }

    /// Completion bookkeeping for one job, then wake the dispatcher.
    fn finish(self: &Arc<Self>, id: &JobId) {
        {
            let mut state = self.lock();
            if state.complete(&self.config, id, Instant::now()) {
                let sweeper = self.runtime.spawn(retention::sweep(Arc::clone(self)));
                state.retention.arm(sweeper);
            }
        }
        debug!(job_id = %id, "job finished");
        self.wake.notify_one();
    }

    fn report_failure(&self, err: &JobError) {
        let context = json!({
            "job_id": err.job_id(),
            "error": err.to_string(),
        });
        self.logger.log(LogLevel::Error, "job failed", &context);
    }
}

/// In-process FIFO job queue.
///
/// Owns its background tasks: a dispatcher, and a retention sweeper while
/// completed ids are retained. Both are cancelled by [`JobQueue::destroy`],
/// which also runs on drop.
///
/// # Example
/// ```ignore
/// let queue = JobQueueBuilder::new()
///     .unique_job_id(true)
///     .max_concurrency(4)
///     .build(handler_fn(|job: Keyed<Order>| async move { ship(job.payload).await }))?;
///
/// queue.submit(Keyed::new("order-1", order))?;
/// let receipt = queue.submit_and_wait(Keyed::new("order-2", other))?.await?;
/// ```
pub struct JobQueue<J: Job, H: Handler<J>> {
    shared: Arc<Shared<J, H>>,
    id_generator: Arc<dyn IdGenerator>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<J: Job, H: Handler<J>> JobQueue<J, H> {
    /// Validate `config` and start the queue with default collaborators.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: QueueConfig, handler: H) -> Result<Self, ConfigError> {
        JobQueueBuilder::from_config(config).build(handler)
    }

    pub(crate) fn start(
        config: QueueConfig,
        handler: H,
        logger: Arc<dyn JobLogger>,
        id_generator: Arc<dyn IdGenerator>,
        runtime: Handle,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::new(&config)),
            config,
            handler,
            logger,
            runtime: runtime.clone(),
            wake: Notify::new(),
        });
        let dispatcher = runtime.spawn(dispatcher::run(Arc::clone(&shared)));
        Self {
            shared,
            id_generator,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Queue a job without waiting for it. Returns the id it was admitted under.
    pub fn submit(&self, job: J) -> Result<JobId, QueueError> {
        let id = self.resolve_id(&job);
        self.enqueue(Envelope::new(id.clone(), job, None))?;
        Ok(id)
    }

    /// Queue a job and get a future for its outcome.
    ///
    /// Admission is decided here, synchronously; only the outcome is deferred.
    pub fn submit_and_wait(&self, job: J) -> Result<Completion<H::Output>, QueueError> {
        let id = self.resolve_id(&job);
        let (tx, rx) = oneshot::channel();
        let reply: Reply<H::Output> = tx;
        self.enqueue(Envelope::new(id.clone(), job, Some(reply)))?;
        Ok(Completion::new(id, rx))
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats(&self.shared.config)
    }

    /// `true` when `max_queue_length` is set and reached.
    pub fn is_full(&self) -> bool {
        self.shared.lock().is_full(&self.shared.config)
    }

    /// Drop every job not yet dispatched. Running jobs are unaffected.
    pub fn clear(&self) {
        let dropped = self.shared.lock().clear();
        debug!(dropped, "cleared pending jobs");
    }

    /// Stop dispatching, drop pending jobs, forget dedup state and cancel timers.
    ///
    /// Jobs already running are not aborted. Later submissions fail with
    /// [`QueueError::Destroyed`].
    pub fn destroy(&self) {
        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.abort();
        }
        self.shared.lock().destroy();
        debug!("queue destroyed");
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    fn resolve_id(&self, job: &J) -> JobId {
        job.job_id().unwrap_or_else(|| self.id_generator.generate())
    }

    fn enqueue(&self, envelope: Envelope<J, H::Output>) -> Result<(), QueueError> {
        let id = envelope.id.clone();
        let admitted = self
            .shared
            .lock()
            .admit(&self.shared.config, envelope, Instant::now());
        if let Err(err) = admitted {
            debug!(job_id = %id, error = %err, "job rejected");
            return Err(err);
        }
        debug!(job_id = %id, "job queued");
        self.shared.wake.notify_one();
        Ok(())
    }
}

impl<J: Job, H: Handler<J>> Drop for JobQueue<J, H> {
    fn drop(&mut self) {
        self.destroy();
    }
}
