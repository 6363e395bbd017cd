//! JobLogger port - ジョブ失敗の報告先
//!
//! 失敗したジョブ 1 件につき `log` がちょうど 1 回呼ばれる。logger が何をするかに
//! queue は関知しない（失敗しても次のジョブは普通に dispatch される）。
//!
//! # 実装
//! - **TracingLogger**: `tracing` に流す（デフォルト）

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// # Thread Safety
/// - `Send + Sync` を要求（各ジョブのタスクから呼ばれる）
pub trait JobLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &Value);
}

/// デフォルトの logger。`jobline::jobs` target で `tracing` に流す
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl JobLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        match level {
            LogLevel::Debug => debug!(target: "jobline::jobs", %context, "{message}"),
            LogLevel::Info => info!(target: "jobline::jobs", %context, "{message}"),
            LogLevel::Warn => warn!(target: "jobline::jobs", %context, "{message}"),
            LogLevel::Error => error!(target: "jobline::jobs", %context, "{message}"),
        }
    }
}
