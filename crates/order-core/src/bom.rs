//! BOM 行項模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::part::PartId;

/// BOM 行項（父組件用料表中的一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    /// 父組件ID
    pub parent_id: PartId,

    /// 子零件ID
    pub sub_part_id: PartId,

    /// 單位用量（每一個父組件需要的數量）
    pub quantity_per: Decimal,

    /// 是否允許以變體庫存抵用（模板零件）
    pub allow_variants: bool,

    /// 行項層級的耗材標記
    pub consumable: bool,
}

impl BomLine {
    /// 創建新的 BOM 行項
    pub fn new(parent_id: PartId, sub_part_id: PartId, quantity_per: Decimal) -> Self {
        Self {
            parent_id,
            sub_part_id,
            quantity_per,
            allow_variants: true,
            consumable: false,
        }
    }

    /// 建構器模式：禁用變體庫存抵用
    pub fn without_variants(mut self) -> Self {
        self.allow_variants = false;
        self
    }

    /// 建構器模式：標記為耗材行項
    pub fn as_consumable(mut self) -> Self {
        self.consumable = true;
        self
    }
}
