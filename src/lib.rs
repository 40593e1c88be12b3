//! # Nexus Order
//!
//! InvenTree 相容庫存服務之上的訂單需求計算引擎。
//!
//! 給定目標組件與建造數量，計算需要採購的基礎零件數量與需要
//! 生產的子組件數量：兩段式遞迴 BOM 展開（毛需求、淨需求），
//! 對照現有庫存、外部已承諾需求與在途訂單結算。

// Re-export 主要類型
pub use order_api::{CachedInventory, InventoryService, MemoryInventory, RestInventory};
pub use order_calc::{
    export, CalcResult, CalcWarning, ExclusionFilter, OrderCalculator, StockView,
};
pub use order_core::{
    BomLine, BuildLine, CalcOptions, CatalogEntry, Deadline, Demand, OpenOrders, OrderError,
    OrderLine, PartId, PartMeta, Result, ServiceConfig,
};
