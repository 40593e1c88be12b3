//! NET 遍歷的庫存視圖

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use order_core::{PartId, PartMeta};

/// 可抵用的變體庫存
///
/// 模板零件若在本輪任一 BOM 行項被標記「不允許變體」，全輪停用變體庫存抵用。
pub fn pooled_variant_stock(meta: &PartMeta, template_only: &HashSet<PartId>) -> Decimal {
    if meta.is_template && !template_only.contains(&meta.id) {
        meta.variant_stock
    } else {
        Decimal::ZERO
    }
}

/// NET 遍歷期間的有狀態庫存視圖
///
/// 同一子組件在多條需求路徑上共享：先遍歷者優先扣用，
/// 之後的路徑只看得到扣用後的餘量。
#[derive(Debug, Default)]
pub struct StockView {
    available: HashMap<PartId, Decimal>,
}

impl StockView {
    /// 創建空的視圖
    pub fn new() -> Self {
        Self::default()
    }

    /// 設置零件的初始可用量（可為負：外部承諾超過庫存）
    pub fn set(&mut self, id: PartId, available: Decimal) {
        self.available.insert(id, available);
    }

    /// 扣用 `need` 的可用量，回傳未被滿足的缺口
    ///
    /// 負的初始可用量只在首次扣用時放大缺口一次，之後視圖歸零。
    pub fn consume(&mut self, id: PartId, need: Decimal) -> Decimal {
        let available = self.available.entry(id).or_insert(Decimal::ZERO);
        let shortfall = (need - *available).max(Decimal::ZERO);
        *available -= need - shortfall;
        shortfall
    }

    /// 查詢目前餘量
    pub fn remaining(&self, id: PartId) -> Decimal {
        self.available.get(&id).copied().unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_consume_with_sufficient_stock() {
        let mut view = StockView::new();
        view.set(PartId(110), dec!(10));

        assert_eq!(view.consume(PartId(110), dec!(4)), dec!(0));
        assert_eq!(view.remaining(PartId(110)), dec!(6));
    }

    #[test]
    fn test_consume_shared_across_paths() {
        // 兩條路徑共享同一子組件：5 庫存，先 3 後 4
        let mut view = StockView::new();
        view.set(PartId(110), dec!(5));

        assert_eq!(view.consume(PartId(110), dec!(3)), dec!(0));
        assert_eq!(view.consume(PartId(110), dec!(4)), dec!(2));
        assert_eq!(view.remaining(PartId(110)), dec!(0));
    }

    #[test]
    fn test_consume_with_negative_available() {
        // 外部承諾超過庫存：缺口只放大一次
        let mut view = StockView::new();
        view.set(PartId(110), dec!(-2));

        assert_eq!(view.consume(PartId(110), dec!(5)), dec!(7));
        assert_eq!(view.remaining(PartId(110)), dec!(0));
        assert_eq!(view.consume(PartId(110), dec!(4)), dec!(4));
    }

    #[test]
    fn test_unknown_part_has_zero_available() {
        let mut view = StockView::new();
        assert_eq!(view.consume(PartId(999), dec!(3)), dec!(3));
    }

    #[test]
    fn test_pooled_variant_stock() {
        let mut template_only = HashSet::new();
        let template = PartMeta::new(PartId(300), "Template")
            .as_template()
            .with_variant_stock(dec!(10));

        assert_eq!(pooled_variant_stock(&template, &template_only), dec!(10));

        template_only.insert(PartId(300));
        assert_eq!(pooled_variant_stock(&template, &template_only), dec!(0));

        let plain = PartMeta::new(PartId(301), "Plain").with_variant_stock(dec!(10));
        assert_eq!(pooled_variant_stock(&plain, &HashSet::new()), dec!(0));
    }
}
