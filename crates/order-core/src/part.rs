//! 零件模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 零件ID（外部庫存服務的穩定主鍵）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartId(pub u32);

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PartId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(PartId)
    }
}

impl From<u32> for PartId {
    fn from(raw: u32) -> Self {
        PartId(raw)
    }
}

/// BOM 路徑（用於迴圈錯誤回報）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomPath(pub Vec<PartId>);

impl std::fmt::Display for BomPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" → ");
        write!(f, "{}", joined)
    }
}

/// 零件快照（單次計算期間有效）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartMeta {
    /// 零件ID
    pub id: PartId,

    /// 零件名稱
    pub name: String,

    /// 是否為組件（帶 BOM）
    #[serde(default)]
    pub is_assembly: bool,

    /// 是否為模板零件
    #[serde(default)]
    pub is_template: bool,

    /// 是否為耗材
    #[serde(default)]
    pub consumable: bool,

    /// 現有庫存
    #[serde(default)]
    pub in_stock: Decimal,

    /// 變體庫存（模板零件的具體變體總庫存）
    #[serde(default)]
    pub variant_stock: Decimal,
}

impl PartMeta {
    /// 創建新的零件快照
    pub fn new(id: PartId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_assembly: false,
            is_template: false,
            consumable: false,
            in_stock: Decimal::ZERO,
            variant_stock: Decimal::ZERO,
        }
    }

    /// 建構器模式：標記為組件
    pub fn as_assembly(mut self) -> Self {
        self.is_assembly = true;
        self
    }

    /// 建構器模式：標記為模板零件
    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    /// 建構器模式：標記為耗材
    pub fn as_consumable(mut self) -> Self {
        self.consumable = true;
        self
    }

    /// 建構器模式：設置現有庫存
    pub fn with_in_stock(mut self, in_stock: Decimal) -> Self {
        self.in_stock = in_stock;
        self
    }

    /// 建構器模式：設置變體庫存
    pub fn with_variant_stock(mut self, variant_stock: Decimal) -> Self {
        self.variant_stock = variant_stock;
        self
    }
}

/// 類別目錄項（選擇介面的候選零件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// 零件ID
    pub id: PartId,

    /// 零件名稱
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_part_id_parse() {
        let id: PartId = " 191 ".parse().unwrap();
        assert_eq!(id, PartId(191));
        assert!("abc".parse::<PartId>().is_err());
    }

    #[test]
    fn test_part_meta_builder() {
        let meta = PartMeta::new(PartId(100), "Gehäuse")
            .as_assembly()
            .with_in_stock(dec!(12.5))
            .with_variant_stock(dec!(3));

        assert!(meta.is_assembly);
        assert!(!meta.is_template);
        assert_eq!(meta.in_stock, dec!(12.5));
        assert_eq!(meta.variant_stock, dec!(3));
    }
}
