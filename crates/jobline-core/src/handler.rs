//! Handler - the unit of work bound to a queue at construction.
//!
//! A queue has exactly one handler. Every admitted job is moved into
//! `handle` once; the returned value (or error) is the job's outcome.

use std::future::Future;

use async_trait::async_trait;

use crate::domain::Job;
use crate::error::BoxError;

/// Executes jobs of type `J`.
///
/// # Example
/// ```ignore
/// struct Charge;
///
/// #[async_trait]
/// impl Handler<Keyed<Invoice>> for Charge {
///     type Output = Receipt;
///
///     async fn handle(&self, job: Keyed<Invoice>) -> Result<Receipt, BoxError> {
///         billing::charge(job.payload).await.map_err(Into::into)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<J: Job>: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn handle(&self, job: J) -> Result<Self::Output, BoxError>;
}

/// Adapter turning an async closure into a [`Handler`]. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap `Fn(J) -> impl Future<Output = Result<T, E>>` as a handler.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

#[async_trait]
impl<J, F, Fut, T, E> Handler<J> for HandlerFn<F>
where
    J: Job,
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    type Output = T;

    async fn handle(&self, job: J) -> Result<T, BoxError> {
        (self.f)(job).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Keyed;

    struct Double;

    #[async_trait]
    impl Handler<Keyed<u32>> for Double {
        type Output = u32;

        async fn handle(&self, job: Keyed<u32>) -> Result<u32, BoxError> {
            Ok(job.payload * 2)
        }
    }

    #[tokio::test]
    async fn struct_handler_runs() {
        assert_eq!(Double.handle(Keyed::anonymous(4)).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn closure_handler_converts_errors() {
        let handler = handler_fn(|job: Keyed<u32>| async move {
            if job.payload == 0 {
                Err(std::io::Error::other("zero"))
            } else {
                Ok(job.payload + 1)
            }
        });

        assert_eq!(handler.handle(Keyed::anonymous(1)).await.unwrap(), 2);
        let err = handler.handle(Keyed::anonymous(0)).await.unwrap_err();
        assert_eq!(err.to_string(), "zero");
    }
}
