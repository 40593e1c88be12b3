//! # Order API
//!
//! 庫存服務資料存取層：服務介面、REST 客戶端與單次計算的記憶快取

pub mod cache;
pub mod cached;
pub mod memory;
pub mod rest;
pub mod service;

// Re-export 主要類型
pub use cached::CachedInventory;
pub use memory::MemoryInventory;
pub use rest::RestInventory;
pub use service::{
    BuildOrderLine, InventoryService, ManufacturerLink, PurchaseOrderLine, SupplierLink,
};
