//! Clock port - 壁時計の抽象化
//!
//! 壁時計が必要なのは id 生成だけ。dispatch 間隔や retention の期限は
//! `tokio::time::Instant` で測るので、runtime の時計（テストでは一時停止できる）に従う。
//!
//! # 実装
//! - **SystemClock**: 本番用
//! - **FixedClock**: テスト用

use chrono::{DateTime, Utc};

/// 現在時刻を返す
///
/// # Thread Safety
/// - `Send + Sync` を要求（dispatcher と呼び出し側の両方から使われる）
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 常に同じ時刻を返す（テスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_does_not_move() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }
}
