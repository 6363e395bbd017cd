//! IdGenerator port - id を持たないジョブの採番
//!
//! 生成した id も呼び出し側が付けた id と同じ重複排除ルールに乗る。
//! 同時に生きているジョブの間で一意であれば十分で、セキュリティ上の意味はない。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（デフォルト）
//! - **SequentialIdGenerator**: `{prefix}-{n}` の連番（デモ・テスト用）

use std::sync::atomic::{AtomicU64, Ordering};

use ulid::Ulid;

use crate::domain::JobId;
use crate::ports::{Clock, SystemClock};

/// # Thread Safety
/// - `Send + Sync` を要求（`submit` は複数タスクから同時に呼ばれうる）
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> JobId;
}

/// ULID ベースの generator
///
/// # ULID の特性
/// - 時刻でソート可能
/// - 下位 80-bit は乱数
pub struct UlidGenerator<C = SystemClock> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl Default for UlidGenerator<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate(&self) -> JobId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        JobId::from(ulid.to_string())
    }
}

/// カウンタによる `{prefix}-{n}` 形式の id。決定的なのでログが読みやすい
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> JobId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        JobId::from(format!("{}-{}", self.prefix, n))
    }
}
