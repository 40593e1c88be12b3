//! 記憶體內庫存服務（測試替身）

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use order_core::{BomLine, CatalogEntry, PartId, PartMeta, Result};

use crate::service::{
    BuildOrderLine, InventoryService, ManufacturerLink, PurchaseOrderLine, SupplierLink,
};

/// 服務呼叫計數（跨複本共享，供快取測試驗證）
#[derive(Debug, Clone, Default)]
pub struct Counters {
    part_get: Arc<AtomicUsize>,
    part_list: Arc<AtomicUsize>,
    bom_items: Arc<AtomicUsize>,
}

impl Counters {
    /// `part_get` 被呼叫的次數
    pub fn part_get(&self) -> usize {
        self.part_get.load(Ordering::SeqCst)
    }

    /// `part_list` 被呼叫的次數
    pub fn part_list(&self) -> usize {
        self.part_list.load(Ordering::SeqCst)
    }

    /// `bom_items` 被呼叫的次數
    pub fn bom_items(&self) -> usize {
        self.bom_items.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct OrderSeed {
    part: PartId,
    quantity: Decimal,
    done: Decimal,
    status: i32,
}

/// 以記憶體資料實作的庫存服務
///
/// 建構器模式填充零件、BOM 與訂單資料；所有測試共用這個替身。
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    parts: HashMap<PartId, PartMeta>,
    boms: HashMap<PartId, Vec<BomLine>>,
    requirements: HashMap<PartId, Decimal>,
    purchase_lines: Vec<OrderSeed>,
    build_lines: Vec<OrderSeed>,
    suppliers: Vec<(PartId, String)>,
    manufacturers: HashMap<PartId, String>,
    categories: HashMap<u32, Vec<PartId>>,
    counters: Counters,
}

impl MemoryInventory {
    /// 創建空的服務
    pub fn new() -> Self {
        Self::default()
    }

    /// 共享的呼叫計數
    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }

    /// 建構器模式：加入零件
    pub fn with_part(mut self, meta: PartMeta) -> Self {
        self.parts.insert(meta.id, meta);
        self
    }

    /// 建構器模式：加入 BOM 行項
    pub fn with_bom_line(mut self, line: BomLine) -> Self {
        self.boms.entry(line.parent_id).or_default().push(line);
        self
    }

    /// 建構器模式：設置外部已承諾需求
    pub fn with_requirement(mut self, id: PartId, required: Decimal) -> Self {
        self.requirements.insert(id, required);
        self
    }

    /// 建構器模式：加入採購訂單行項
    pub fn with_purchase_line(
        mut self,
        part: PartId,
        quantity: Decimal,
        received: Decimal,
        status: i32,
    ) -> Self {
        self.purchase_lines.push(OrderSeed {
            part,
            quantity,
            done: received,
            status,
        });
        self
    }

    /// 建構器模式：加入生產工單行項
    pub fn with_build_line(
        mut self,
        part: PartId,
        quantity: Decimal,
        completed: Decimal,
        status: i32,
    ) -> Self {
        self.build_lines.push(OrderSeed {
            part,
            quantity,
            done: completed,
            status,
        });
        self
    }

    /// 建構器模式：加入供應商關聯
    pub fn with_supplier(mut self, part: PartId, supplier_name: impl Into<String>) -> Self {
        self.suppliers.push((part, supplier_name.into()));
        self
    }

    /// 建構器模式：設置製造商
    pub fn with_manufacturer(mut self, part: PartId, manufacturer_name: impl Into<String>) -> Self {
        self.manufacturers.insert(part, manufacturer_name.into());
        self
    }

    /// 建構器模式：設置類別成員
    pub fn with_category(mut self, category_id: u32, parts: Vec<PartId>) -> Self {
        self.categories.insert(category_id, parts);
        self
    }
}

#[async_trait]
impl InventoryService for MemoryInventory {
    async fn part_get(&self, id: PartId) -> Result<Option<PartMeta>> {
        self.counters.part_get.fetch_add(1, Ordering::SeqCst);
        Ok(self.parts.get(&id).cloned())
    }

    async fn part_list(&self, ids: &[PartId]) -> Result<Vec<PartMeta>> {
        self.counters.part_list.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.parts.get(id).cloned())
            .collect())
    }

    async fn parts_in_category(&self, category_id: u32) -> Result<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .categories
            .get(&category_id)
            .into_iter()
            .flatten()
            .filter_map(|id| {
                self.parts.get(id).map(|meta| CatalogEntry {
                    id: meta.id,
                    name: meta.name.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn bom_items(&self, parent_id: PartId) -> Result<Vec<BomLine>> {
        self.counters.bom_items.fetch_add(1, Ordering::SeqCst);
        Ok(self.boms.get(&parent_id).cloned().unwrap_or_default())
    }

    async fn part_requirements(&self, id: PartId) -> Result<Decimal> {
        Ok(self.requirements.get(&id).copied().unwrap_or(Decimal::ZERO))
    }

    async fn purchase_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<PurchaseOrderLine>> {
        Ok(self
            .purchase_lines
            .iter()
            .filter(|seed| ids.contains(&seed.part) && statuses.contains(&seed.status))
            .map(|seed| PurchaseOrderLine {
                part: seed.part,
                quantity: seed.quantity,
                received: seed.done,
            })
            .collect())
    }

    async fn build_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<BuildOrderLine>> {
        Ok(self
            .build_lines
            .iter()
            .filter(|seed| ids.contains(&seed.part) && statuses.contains(&seed.status))
            .map(|seed| BuildOrderLine {
                part: seed.part,
                quantity: seed.quantity,
                completed: seed.done,
            })
            .collect())
    }

    async fn supplier_parts(&self, ids: &[PartId]) -> Result<Vec<SupplierLink>> {
        Ok(self
            .suppliers
            .iter()
            .filter(|(part, _)| ids.contains(part))
            .map(|(part, name)| SupplierLink {
                part: *part,
                supplier_name: name.clone(),
            })
            .collect())
    }

    async fn manufacturer_parts(&self, ids: &[PartId]) -> Result<Vec<ManufacturerLink>> {
        Ok(self
            .manufacturers
            .iter()
            .filter(|(part, _)| ids.contains(part))
            .map(|(part, name)| ManufacturerLink {
                part: *part,
                manufacturer_name: name.clone(),
            })
            .collect())
    }
}
