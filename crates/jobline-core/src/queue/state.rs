//! Queue state and the admission guard.
//!
//! Everything here is synchronous. The queue keeps one `QueueState` behind a
//! mutex and every method below runs as a single step under that lock.

use std::collections::{HashSet, VecDeque};

use tokio::sync::oneshot;
use tokio::time::Instant;

use super::QueueConfig;
use super::retention::RetentionLedger;
use crate::domain::JobId;
use crate::error::{JobError, QueueError};
use crate::observability::QueueStats;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, JobError>>;

/// A job as the queue sees it: resolved id, owned job, optional result bridge.
pub(crate) struct Envelope<J, T> {
    pub(crate) id: JobId,
    pub(crate) job: J,
    pub(crate) reply: Option<Reply<T>>,
}

impl<J, T> Envelope<J, T> {
    pub(crate) fn new(id: JobId, job: J, reply: Option<Reply<T>>) -> Self {
        Self { id, job, reply }
    }
}

pub(crate) struct QueueState<J, T> {
    /// FIFO in admission order.
    pending: VecDeque<Envelope<J, T>>,

    /// Jobs holding a concurrency slot (popped, not yet finished).
    in_flight: usize,

    /// Ids pending or in flight. Only maintained with `unique_job_id`.
    active: HashSet<JobId>,

    pub(crate) retention: RetentionLedger,

    last_dispatched_id: Option<JobId>,
    last_added_id: Option<JobId>,
    destroyed: bool,
}

impl<J, T> QueueState<J, T> {
    pub(crate) fn new(config: &QueueConfig) -> Self {
        let window = if config.tracks_completions() {
            config.retention()
        } else {
            None
        };
        Self {
            pending: VecDeque::new(),
            in_flight: 0,
            active: HashSet::new(),
            retention: RetentionLedger::new(window),
            last_dispatched_id: None,
            last_added_id: None,
            destroyed: false,
        }
    }

    /// Admission guard: sweep expired ids, check capacity then identity, enqueue.
    ///
    /// On error nothing has been mutated apart from the retention sweep.
    pub(crate) fn admit(
        &mut self,
        config: &QueueConfig,
        envelope: Envelope<J, T>,
        now: Instant,
    ) -> Result<(), QueueError> {
        if self.destroyed {
            return Err(QueueError::Destroyed);
        }
        self.retention.purge_expired(now);

        if let Some(max) = config.max_queue_length
            && self.pending.len() >= max
        {
            return Err(QueueError::QueueFull {
                length: self.pending.len(),
            });
        }

        if config.unique_job_id {
            let id = envelope.id.as_str();
            if self.active.contains(id) || self.retention.contains(id) {
                return Err(QueueError::DuplicateJob(envelope.id));
            }
            self.active.insert(envelope.id.clone());
        }

        self.last_added_id = Some(envelope.id.clone());
        self.pending.push_back(envelope);
        Ok(())
    }

    /// Pop the head of the queue if a concurrency slot is free, taking the slot.
    ///
    /// The id stays reserved in `active` until [`Self::complete`].
    pub(crate) fn take_next(&mut self, max_concurrency: usize) -> Option<Envelope<J, T>> {
        if self.destroyed || self.in_flight >= max_concurrency {
            return None;
        }
        let envelope = self.pending.pop_front()?;
        self.in_flight += 1;
        Some(envelope)
    }

    pub(crate) fn mark_dispatched(&mut self, id: &JobId) {
        self.last_dispatched_id = Some(id.clone());
    }

    /// Release the slot held by `id`.
    ///
    /// Returns `true` when the id went into the retention ledger and no sweeper
    /// is armed yet.
    pub(crate) fn complete(&mut self, config: &QueueConfig, id: &JobId, now: Instant) -> bool {
        if self.destroyed {
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        if !config.unique_job_id {
            return false;
        }
        self.active.remove(id.as_str());
        self.retention.record(id.clone(), now)
    }

    /// Drop every pending job. Returns how many were dropped.
    ///
    /// Dropping an envelope drops its reply sender, which resolves the
    /// matching `Completion` as cancelled.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        for envelope in self.pending.drain(..) {
            self.active.remove(envelope.id.as_str());
        }
        dropped
    }

    pub(crate) fn destroy(&mut self) {
        self.clear();
        self.in_flight = 0;
        self.active.clear();
        self.retention.clear();
        self.destroyed = true;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn is_full(&self, config: &QueueConfig) -> bool {
        config
            .max_queue_length
            .is_some_and(|max| self.pending.len() >= max)
    }

    pub(crate) fn stats(&self, config: &QueueConfig) -> QueueStats {
        QueueStats {
            queue_length: self.pending.len(),
            in_flight: self.in_flight,
            max_concurrency: config.max_concurrency,
            retained_count: self.retention.len(),
            is_processing: self.in_flight > 0,
            last_dispatched_id: self.last_dispatched_id.clone(),
            last_added_id: self.last_added_id.clone(),
        }
    }
}
