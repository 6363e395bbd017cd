//! JobQueueBuilder - キューの構築と検証
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: バックグラウンドタスクを spawn する前に
//!   config の全制約と Tokio runtime の有無を確認する
//! - port の差し込み（logger / id generator）

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{JobQueue, QueueConfig};
use crate::domain::Job;
use crate::error::ConfigError;
use crate::handler::Handler;
use crate::ports::{IdGenerator, JobLogger, TracingLogger, UlidGenerator};

/// JobQueueBuilder は [`JobQueue`] を構築
///
/// # 使用例
/// ```ignore
/// let queue = JobQueueBuilder::new()
///     .unique_job_id(true)
///     .retention(Duration::from_secs(30))
///     .rate_limit_per_second(5.0)
///     .build(handler)?;
/// ```
pub struct JobQueueBuilder {
    config: QueueConfig,
    logger: Arc<dyn JobLogger>,
    id_generator: Arc<dyn IdGenerator>,
}

impl JobQueueBuilder {
    pub fn new() -> Self {
        Self::from_config(QueueConfig::default())
    }

    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            config,
            logger: Arc::new(TracingLogger),
            id_generator: Arc::new(UlidGenerator::default()),
        }
    }

    pub fn unique_job_id(mut self, unique: bool) -> Self {
        self.config.unique_job_id = unique;
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = max;
        self
    }

    pub fn rate_limit_per_second(mut self, rate: f64) -> Self {
        self.config.rate_limit_per_second = Some(rate);
        self
    }

    /// 完了した id が再投入をブロックし続ける期間。`unique_job_id` が必要
    pub fn retention(mut self, window: Duration) -> Self {
        let ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self.config.retention_ms = Some(ms);
        self
    }

    pub fn max_queue_length(mut self, max: usize) -> Self {
        self.config.max_queue_length = Some(max);
        self
    }

    /// 失敗ジョブの報告先。デフォルトは [`TracingLogger`]
    pub fn logger(mut self, logger: impl JobLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// id なしジョブの採番。デフォルトは [`UlidGenerator`]
    pub fn id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    /// config を検証し、現在の Tokio runtime 上でキューを起動する
    ///
    /// # Errors
    /// - config の制約違反（最初に見つかったもの）
    /// - runtime の外から呼ばれた場合は [`ConfigError::NoRuntime`]
    pub fn build<J: Job, H: Handler<J>>(self, handler: H) -> Result<JobQueue<J, H>, ConfigError> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        if self.config.retention_ms.is_some() && !self.config.unique_job_id {
            warn!("retention_ms has no effect unless unique_job_id is enabled");
        }
        debug!(config = ?self.config, "starting job queue");

        Ok(JobQueue::start(
            self.config,
            handler,
            self.logger,
            self.id_generator,
            runtime,
        ))
    }
}

impl Default for JobQueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}
