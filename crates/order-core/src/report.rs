//! 計算結果列模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::part::PartId;

/// 採購建議列（基礎零件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// 零件ID
    pub part_id: PartId,

    /// 零件名稱
    pub name: String,

    /// 淨需求數量
    pub required: Decimal,

    /// 可用庫存（現有庫存扣除外部已承諾需求）
    pub available: Decimal,

    /// 在途採購數量
    pub on_order: Decimal,

    /// 建議採購數量
    pub to_order: Decimal,

    /// 首個產生此需求的目標組件ID
    pub root_id: PartId,

    /// 首個產生此需求的目標組件名稱
    pub root_name: String,
}

/// 生產建議列（子組件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildLine {
    /// 零件ID
    pub part_id: PartId,

    /// 零件名稱
    pub name: String,

    /// 本次計算的總需求（毛需求）
    pub total_needed: Decimal,

    /// 現有庫存
    pub in_stock: Decimal,

    /// 生產中數量
    pub in_progress: Decimal,

    /// 可用庫存（含可抵用的變體庫存，扣除外部已承諾需求）
    pub available: Decimal,

    /// 建議生產數量
    pub to_build: Decimal,
}
