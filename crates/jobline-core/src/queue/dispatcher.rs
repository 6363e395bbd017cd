//! Dispatcher loop.
//!
//! One task per queue. It drains the head of the queue while a concurrency
//! slot is free, spacing dispatches by the rate-limit interval, then parks on
//! the queue's `Notify` until an admission or a completion wakes it again.
//! Each dispatched job runs in its own task so a slow job never blocks the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::{self, Instant};
use tracing::debug;

use super::Shared;
use super::state::Envelope;
use crate::domain::{Job, JobId};
use crate::error::JobError;
use crate::handler::Handler;

pub(crate) enum Next<J, T> {
    Dispatch(Envelope<J, T>),
    Idle,
    Stopped,
}

pub(crate) async fn run<J: Job, H: Handler<J>>(shared: Arc<Shared<J, H>>) {
    let interval = shared.config.dispatch_interval();
    let mut last_dispatch: Option<Instant> = None;

    loop {
        let envelope = match shared.next() {
            Next::Dispatch(envelope) => envelope,
            Next::Idle => {
                shared.wake.notified().await;
                continue;
            }
            Next::Stopped => break,
        };

        if let Some(interval) = interval {
            if let Some(last) = last_dispatch {
                time::sleep_until(last + interval).await;
            }
            last_dispatch = Some(Instant::now());
        }

        // destroyed while waiting on the rate limit
        if !shared.mark_dispatched(&envelope.id) {
            break;
        }
        launch(&shared, envelope);
    }
    debug!("dispatcher stopped");
}

fn launch<J: Job, H: Handler<J>>(shared: &Arc<Shared<J, H>>, envelope: Envelope<J, H::Output>) {
    let Envelope { id, job, reply } = envelope;
    debug!(job_id = %id, "dispatching job");

    let shared = Arc::clone(shared);
    let runtime = shared.runtime.clone();
    runtime.spawn(async move {
        let outcome = execute(&shared, &id, job).await;
        if let Err(err) = &outcome {
            shared.report_failure(err);
        }
        shared.finish(&id);
        if let Some(reply) = reply {
            // receiver gone: the caller stopped waiting
            let _ = reply.send(outcome);
        }
    });
}

async fn execute<J: Job, H: Handler<J>>(
    shared: &Shared<J, H>,
    id: &JobId,
    job: J,
) -> Result<H::Output, JobError> {
    match AssertUnwindSafe(shared.handler.handle(job)).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(JobError::Failed {
            id: id.clone(),
            source,
        }),
        Err(panic) => Err(JobError::Panicked {
            id: id.clone(),
            message: panic_message(panic.as_ref()),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_both_string_kinds() {
        let borrowed: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(borrowed.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
