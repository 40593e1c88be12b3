//! 庫存服務介面

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use order_core::{BomLine, CatalogEntry, PartId, PartMeta, Result};

/// 在途採購訂單行項
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    /// 零件ID
    pub part: PartId,

    /// 訂購數量
    pub quantity: Decimal,

    /// 已收貨數量
    #[serde(default)]
    pub received: Decimal,
}

impl PurchaseOrderLine {
    /// 未收貨餘量
    pub fn remaining(&self) -> Decimal {
        self.quantity - self.received
    }
}

/// 在途生產工單行項
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOrderLine {
    /// 零件ID
    pub part: PartId,

    /// 工單數量
    pub quantity: Decimal,

    /// 已完工數量
    #[serde(default)]
    pub completed: Decimal,
}

impl BuildOrderLine {
    /// 未完工餘量
    pub fn remaining(&self) -> Decimal {
        self.quantity - self.completed
    }
}

/// 零件與供應商的關聯
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierLink {
    /// 零件ID
    pub part: PartId,

    /// 供應商名稱
    pub supplier_name: String,
}

/// 零件與製造商的關聯
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturerLink {
    /// 零件ID
    pub part: PartId,

    /// 製造商名稱
    pub manufacturer_name: String,
}

/// 遠端庫存服務的唯讀操作
///
/// 計算管線只透過這個介面觸網；測試以 [`crate::MemoryInventory`] 替換。
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// 查詢單一零件，不存在回傳 `None`
    async fn part_get(&self, id: PartId) -> Result<Option<PartMeta>>;

    /// 批次查詢零件，回應中缺席的ID視為不存在
    async fn part_list(&self, ids: &[PartId]) -> Result<Vec<PartMeta>>;

    /// 列出類別下的零件（選擇介面的候選清單）
    async fn parts_in_category(&self, category_id: u32) -> Result<Vec<CatalogEntry>>;

    /// 列出零件的 BOM 行項；非組件回傳空序列
    async fn bom_items(&self, parent_id: PartId) -> Result<Vec<BomLine>>;

    /// 查詢零件的外部已承諾需求
    async fn part_requirements(&self, id: PartId) -> Result<Decimal>;

    /// 列出指定狀態的在途採購訂單行項
    async fn purchase_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<PurchaseOrderLine>>;

    /// 列出指定狀態的在途生產工單行項
    async fn build_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<BuildOrderLine>>;

    /// 列出零件的供應商關聯
    async fn supplier_parts(&self, ids: &[PartId]) -> Result<Vec<SupplierLink>>;

    /// 列出零件的製造商關聯
    async fn manufacturer_parts(&self, ids: &[PartId]) -> Result<Vec<ManufacturerLink>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_line_remaining() {
        let line = PurchaseOrderLine {
            part: PartId(200),
            quantity: dec!(10),
            received: dec!(4),
        };
        assert_eq!(line.remaining(), dec!(6));

        let line = BuildOrderLine {
            part: PartId(110),
            quantity: dec!(5),
            completed: dec!(5),
        };
        assert_eq!(line.remaining(), dec!(0));
    }
}
