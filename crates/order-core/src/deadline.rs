//! 計算期限

use std::time::Duration;
use tokio::time::Instant;

use crate::{OrderError, Result};

/// 單次計算的合作式期限
///
/// DAL 在每次網路請求前檢查，遍歷引擎在節點之間檢查；期限一過，
/// 兩者都以 `Canceled` 中止目前操作，由計算入口在最外層轉為
/// `DeadlineExceeded` 回報。
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// 無期限
    pub fn none() -> Self {
        Deadline(None)
    }

    /// 從現在起算的期限
    pub fn after(timeout: Duration) -> Self {
        Deadline(Some(Instant::now() + timeout))
    }

    /// 指定時間點的期限
    pub fn at(instant: Instant) -> Self {
        Deadline(Some(instant))
    }

    /// 檢查期限，已逾時則以 `Canceled` 中止目前操作
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            Err(OrderError::Canceled)
        } else {
            Ok(())
        }
    }

    /// 期限是否已過
    pub fn is_expired(&self) -> bool {
        matches!(self.0, Some(at) if Instant::now() >= at)
    }

    /// 距離期限的剩餘時間
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}
