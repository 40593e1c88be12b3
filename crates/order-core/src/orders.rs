//! 在途訂單模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 單一零件的在途數量（未收貨採購 + 未完工生產）
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OpenOrders {
    /// 未收貨的採購訂單餘量
    pub purchase_open: Decimal,

    /// 未完工的生產工單餘量
    pub build_in_progress: Decimal,
}

impl OpenOrders {
    /// 累加一筆採購訂單餘量（低於零的餘量視為零）
    pub fn add_purchase(&mut self, remaining: Decimal) {
        if remaining > Decimal::ZERO {
            self.purchase_open += remaining;
        }
    }

    /// 累加一筆生產工單餘量（低於零的餘量視為零）
    pub fn add_build(&mut self, remaining: Decimal) {
        if remaining > Decimal::ZERO {
            self.build_in_progress += remaining;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_orders_accumulate() {
        let mut orders = OpenOrders::default();
        orders.add_purchase(dec!(5));
        orders.add_purchase(dec!(2.5));
        // 已超收的訂單行不得倒扣
        orders.add_purchase(dec!(-1));
        orders.add_build(dec!(4));

        assert_eq!(orders.purchase_open, dec!(7.5));
        assert_eq!(orders.build_in_progress, dec!(4));
    }
}
