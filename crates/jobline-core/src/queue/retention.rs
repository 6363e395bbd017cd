//! Retention of completed job ids.
//!
//! A completed id stays in the ledger for the configured window and blocks
//! resubmission while it is there. Records are purged two ways:
//! - opportunistically on every admission, so the next `submit` sees the id freed
//! - by a sweeper task, armed only while the ledger is non-empty

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

use super::Shared;
use crate::domain::{Job, JobId};
use crate::handler::Handler;

pub(crate) struct RetentionLedger {
    window: Option<Duration>,
    ids: HashSet<JobId>,
    /// Completion order. Timestamps are non-decreasing front to back.
    order: VecDeque<(JobId, Instant)>,
    sweeper: Option<JoinHandle<()>>,
}

impl RetentionLedger {
    pub(crate) fn new(window: Option<Duration>) -> Self {
        Self {
            window,
            ids: HashSet::new(),
            order: VecDeque::new(),
            sweeper: None,
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    /// Remember `id` as completed at `now`.
    ///
    /// Returns `true` when no sweeper is armed and the caller must arm one.
    pub(crate) fn record(&mut self, id: JobId, now: Instant) -> bool {
        if self.window.is_none() {
            return false;
        }
        if self.ids.insert(id.clone()) {
            self.order.push_back((id, now));
        }
        self.sweeper.is_none()
    }

    /// Drop every record whose age is at least the window. Returns how many went.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let Some(window) = self.window else {
            return 0;
        };
        let mut purged = 0;
        while let Some((_, completed_at)) = self.order.front() {
            if now.saturating_duration_since(*completed_at) < window {
                break;
            }
            if let Some((id, _)) = self.order.pop_front() {
                self.ids.remove(&id);
            }
            purged += 1;
        }
        purged
    }

    /// When the oldest record expires.
    pub(crate) fn next_expiry(&self) -> Option<Instant> {
        let window = self.window?;
        self.order.front().map(|(_, completed_at)| *completed_at + window)
    }

    pub(crate) fn arm(&mut self, sweeper: JoinHandle<()>) {
        self.sweeper = Some(sweeper);
    }

    /// Called by the sweeper itself right before it exits.
    pub(crate) fn disarm(&mut self) {
        self.sweeper = None;
    }

    /// Forget everything and cancel the sweeper.
    pub(crate) fn clear(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        self.ids.clear();
        self.order.clear();
    }
}

/// Sweeper task: sleep until the oldest record expires, purge, repeat until empty.
pub(crate) async fn sweep<J: Job, H: Handler<J>>(shared: Arc<Shared<J, H>>) {
    loop {
        let deadline = {
            let mut state = shared.lock();
            let purged = state.retention.purge_expired(Instant::now());
            if purged > 0 {
                trace!(purged, remaining = state.retention.len(), "retention sweep");
            }
            match state.retention.next_expiry() {
                Some(deadline) => deadline,
                None => {
                    state.retention.disarm();
                    return;
                }
            }
        };
        time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn record_keeps_the_id_and_asks_for_a_sweeper() {
        let mut ledger = RetentionLedger::new(Some(WINDOW));
        let now = Instant::now();
        assert!(ledger.record(JobId::from("a"), now));
        assert!(ledger.contains("a"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.next_expiry(), Some(now + WINDOW));
    }

    #[test]
    fn without_window_nothing_is_kept() {
        let mut ledger = RetentionLedger::new(None);
        assert!(!ledger.record(JobId::from("a"), Instant::now()));
        assert!(!ledger.contains("a"));
        assert_eq!(ledger.next_expiry(), None);
    }

    #[test]
    fn purge_removes_every_expired_record() {
        let mut ledger = RetentionLedger::new(Some(WINDOW));
        let t0 = Instant::now();
        ledger.record(JobId::from("a"), t0);
        ledger.record(JobId::from("b"), t0 + Duration::from_millis(100));
        ledger.record(JobId::from("c"), t0 + Duration::from_millis(400));

        assert_eq!(ledger.purge_expired(t0 + Duration::from_millis(499)), 0);
        assert_eq!(ledger.purge_expired(t0 + Duration::from_millis(600)), 2);
        assert!(!ledger.contains("a"));
        assert!(!ledger.contains("b"));
        assert!(ledger.contains("c"));
        assert_eq!(
            ledger.next_expiry(),
            Some(t0 + Duration::from_millis(400) + WINDOW)
        );
    }

    #[test]
    fn expiry_is_inclusive_of_the_window() {
        let mut ledger = RetentionLedger::new(Some(WINDOW));
        let t0 = Instant::now();
        ledger.record(JobId::from("a"), t0);
        assert_eq!(ledger.purge_expired(t0 + WINDOW), 1);
        assert_eq!(ledger.len(), 0);
    }

    #[tokio::test]
    async fn clear_aborts_an_armed_sweeper() {
        let (alive, gone) = tokio::sync::oneshot::channel::<()>();
        let sweeper = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<()>().await;
        });

        let mut ledger = RetentionLedger::new(Some(WINDOW));
        assert!(ledger.record(JobId::from("a"), Instant::now()));
        ledger.arm(sweeper);
        assert!(!ledger.record(JobId::from("b"), Instant::now()));

        ledger.clear();
        // the aborted task drops its sender
        assert!(gone.await.is_err());
        assert!(ledger.record(JobId::from("c"), Instant::now()));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut ledger = RetentionLedger::new(Some(WINDOW));
        ledger.record(JobId::from("a"), Instant::now());
        ledger.clear();
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.next_expiry(), None);
    }
}
