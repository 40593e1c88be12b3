//! 需求模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::part::PartId;

/// 頂層需求（使用者輸入：目標組件與建造數量）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    /// 目標組件ID（必須是組件）
    pub root_id: PartId,

    /// 需求數量
    pub quantity: Decimal,
}

impl Demand {
    /// 創建新的需求
    pub fn new(root_id: PartId, quantity: Decimal) -> Self {
        Self { root_id, quantity }
    }
}
