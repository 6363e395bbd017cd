//! FnJob - 関数そのものをジョブとして積む
//!
//! 1 つのキューに 1 つの [`Handler`] を束ねる代わりに、ジョブごとに別々の
//! async クロージャを渡したいときに使う。実行は [`RunFn`] がクロージャを
//! 呼ぶだけなので、順序・並行数・レート制限・重複排除はすべて通常の
//! dispatcher がそのまま担当する。
//!
//! # 学習ポイント
//! - `Box<dyn FnOnce() -> BoxFuture<..>>` による型消去
//! - 「ジョブ = データ」と「ジョブ = 処理」を同じ `Job` / `Handler` の組で表現
//!
//! # Example
//! ```ignore
//! let queue = FnQueue::<String>::for_functions(QueueConfig::default())?;
//!
//! let greeting = queue
//!     .submit_and_wait(FnJob::new(|| async { Ok::<_, BoxError>("hello".to_string()) }))?
//!     .await?;
//! queue.submit(FnJob::new(|| async { flush().await.map(|_| String::new()) }).with_id("flush"))?;
//! ```

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::domain::{Job, JobId};
use crate::error::{BoxError, ConfigError};
use crate::handler::Handler;
use crate::queue::{JobQueue, QueueConfig};

type Thunk<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, BoxError>> + Send>;

/// 一度だけ呼ばれる async クロージャ。
///
/// id を付けなければ queue の `IdGenerator` が採番する。
pub struct FnJob<T> {
    id: Option<JobId>,
    run: Thunk<T>,
}

impl<T: Send + 'static> FnJob<T> {
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            id: None,
            run: Box::new(move || {
                f().map(|result| result.map_err(|e| -> BoxError { e.into() }))
                    .boxed()
            }),
        }
    }

    /// 重複排除に使う id を明示する。
    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl<T> fmt::Debug for FnJob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnJob")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Job for FnJob<T> {
    fn job_id(&self) -> Option<JobId> {
        self.id.clone()
    }
}

/// [`FnJob`] を呼び出すだけの handler。
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFn;

#[async_trait]
impl<T: Send + 'static> Handler<FnJob<T>> for RunFn {
    type Output = T;

    async fn handle(&self, job: FnJob<T>) -> Result<T, BoxError> {
        (job.run)().await
    }
}

/// クロージャを積むキュー。`T` は全ジョブ共通の戻り値型。
pub type FnQueue<T = ()> = JobQueue<FnJob<T>, RunFn>;

impl<T: Send + 'static> JobQueue<FnJob<T>, RunFn> {
    /// `JobQueue::new(config, RunFn)` と同じ。
    pub fn for_functions(config: QueueConfig) -> Result<Self, ConfigError> {
        Self::new(config, RunFn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_fn_calls_the_closure_once() {
        let job = FnJob::new(|| async { Ok::<_, BoxError>(41 + 1) });
        assert_eq!(RunFn.handle(job).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn closure_errors_are_boxed() {
        let job: FnJob<()> = FnJob::new(|| async { Err(std::io::Error::other("disk full")) });
        let err = RunFn.handle(job).await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn id_is_optional() {
        let anonymous = FnJob::new(|| async { Ok::<_, BoxError>(()) });
        assert_eq!(anonymous.job_id(), None);

        let named = FnJob::new(|| async { Ok::<_, BoxError>(()) }).with_id("sync");
        assert_eq!(named.job_id(), Some(JobId::from("sync")));
        assert!(format!("{named:?}").contains("sync"));
    }
}
