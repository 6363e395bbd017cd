//! Result bridge for `submit_and_wait`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::JobId;
use crate::error::JobError;

/// Resolves once with the outcome of one specific job.
///
/// If the job is dropped before it runs (`clear`, `destroy`, or dropping the
/// queue) this resolves to [`JobError::Cancelled`]. Dropping a `Completion`
/// does not cancel the job.
#[must_use = "a Completion does nothing unless awaited"]
pub struct Completion<T> {
    id: JobId,
    rx: oneshot::Receiver<Result<T, JobError>>,
}

impl<T> Completion<T> {
    pub(crate) fn new(id: JobId, rx: oneshot::Receiver<Result<T, JobError>>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, JobError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(JobError::Cancelled(this.id.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_sent_outcome() {
        let (tx, rx) = oneshot::channel();
        let completion = Completion::new(JobId::from("a"), rx);
        assert_eq!(completion.id().as_str(), "a");
        tx.send(Ok(7)).unwrap();
        assert_eq!(completion.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn dropped_sender_means_cancelled() {
        let (tx, rx) = oneshot::channel::<Result<(), JobError>>();
        drop(tx);
        let err = Completion::new(JobId::from("a"), rx).await.unwrap_err();
        assert!(matches!(err, JobError::Cancelled(id) if id.as_str() == "a"));
    }
}
