//! Ports - キューが外部とやり取りする境界
//!
//! queue 本体は trait にだけ依存し、具体的な実装は builder で差し込む。
//!
//! # 構成
//! - **Clock**: 現在時刻（テストでは固定できる）
//! - **IdGenerator**: id を持たないジョブの採番
//! - **JobLogger**: ジョブ失敗の報告先

pub mod clock;
pub mod id_generator;
pub mod job_logger;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, SequentialIdGenerator, UlidGenerator};
pub use self::job_logger::{JobLogger, LogLevel, TracingLogger};
