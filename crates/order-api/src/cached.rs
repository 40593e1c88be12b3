//! 單次計算的記憶化資料存取層

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future;
use rust_decimal::Decimal;

use order_core::{
    BomLine, CatalogEntry, Deadline, OpenOrders, OrderError, PartId, PartMeta, Result,
    ServiceConfig,
};

use crate::service::InventoryService;
use crate::cache::MemoCache;

/// 記憶化的庫存讀取門面
///
/// 單次計算期間的唯一事實來源：同鍵的重複查詢命中記憶體而非網路，
/// 批次操作按 `chunk_size` 分塊並行扇出、在固定順序合併。
/// 生命週期綁定單次計算，計算結束即丟棄。
pub struct CachedInventory<S> {
    service: Arc<S>,
    config: ServiceConfig,
    deadline: Deadline,
    part_meta: MemoCache<PartId, Option<Arc<PartMeta>>>,
    bom_lines: MemoCache<PartId, Arc<Vec<BomLine>>>,
    required: MemoCache<PartId, Decimal>,
    open_orders: MemoCache<PartId, OpenOrders>,
    suppliers: MemoCache<PartId, Arc<BTreeSet<String>>>,
    manufacturers: MemoCache<PartId, Option<Arc<String>>>,
    catalog: MemoCache<u32, Arc<Vec<CatalogEntry>>>,
}

impl<S: InventoryService> CachedInventory<S> {
    /// 以服務與期限建立新的一輪快取
    pub fn new(service: Arc<S>, config: ServiceConfig, deadline: Deadline) -> Self {
        Self {
            service,
            config,
            deadline,
            part_meta: MemoCache::new(),
            bom_lines: MemoCache::new(),
            required: MemoCache::new(),
            open_orders: MemoCache::new(),
            suppliers: MemoCache::new(),
            manufacturers: MemoCache::new(),
            catalog: MemoCache::new(),
        }
    }

    /// 本輪計算的期限
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// 查詢零件快照；不存在的零件快取 `None` 哨兵
    pub async fn part_meta(&self, id: PartId) -> Result<Option<Arc<PartMeta>>> {
        self.deadline.check()?;
        let service = &self.service;
        self.part_meta
            .get_or_try_fetch(id, || async move {
                tracing::debug!("查詢零件快照: {}", id);
                Ok(service.part_get(id).await?.map(Arc::new))
            })
            .await
    }

    /// 查詢零件快照，不存在視為資料錯誤
    pub async fn require_part_meta(&self, id: PartId) -> Result<Arc<PartMeta>> {
        self.part_meta(id)
            .await?
            .ok_or(OrderError::PartNotFound(id))
    }

    /// 查詢 BOM 行項；非組件回傳空序列
    pub async fn bom_lines(&self, parent_id: PartId) -> Result<Arc<Vec<BomLine>>> {
        self.deadline.check()?;
        let service = &self.service;
        self.bom_lines
            .get_or_try_fetch(parent_id, || async move {
                tracing::debug!("查詢 BOM: {}", parent_id);
                Ok(Arc::new(service.bom_items(parent_id).await?))
            })
            .await
    }

    /// 批次預取零件快照，之後的單筆查詢命中記憶體
    pub async fn prefetch_part_metas(&self, ids: &[PartId]) -> Result<()> {
        self.deadline.check()?;
        let missing = self.missing_keys(ids, |id| self.part_meta.peek(id).is_some());
        if missing.is_empty() {
            return Ok(());
        }

        let chunks: Vec<&[PartId]> = missing.chunks(self.config.chunk_size).collect();
        let fetched = future::try_join_all(
            chunks
                .iter()
                .map(|chunk| async move { self.service.part_list(chunk).await }),
        )
        .await?;

        for (chunk, metas) in chunks.iter().zip(fetched) {
            let mut found: HashSet<PartId> = HashSet::new();
            for meta in metas {
                found.insert(meta.id);
                self.part_meta.insert(meta.id, Some(Arc::new(meta)));
            }
            // 回應中缺席的零件視為不存在，哨兵一併快取
            for id in chunk.iter() {
                if !found.contains(id) {
                    self.part_meta.insert(*id, None);
                }
            }
        }
        Ok(())
    }

    /// 批次查詢外部已承諾需求
    pub async fn external_required(&self, ids: &[PartId]) -> Result<HashMap<PartId, Decimal>> {
        self.deadline.check()?;
        let mut map = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.config.chunk_size) {
            let values = future::try_join_all(chunk.iter().map(|&id| async move {
                let value = self
                    .required
                    .get_or_try_fetch(id, || async move {
                        self.service.part_requirements(id).await
                    })
                    .await?;
                Ok::<_, OrderError>((id, value))
            }))
            .await?;
            map.extend(values);
        }
        Ok(map)
    }

    /// 批次查詢在途訂單（採購與生產分開統計）
    pub async fn open_orders(&self, ids: &[PartId]) -> Result<HashMap<PartId, OpenOrders>> {
        self.deadline.check()?;
        let missing = self.missing_keys(ids, |id| self.open_orders.peek(id).is_some());

        if !missing.is_empty() {
            let chunks: Vec<&[PartId]> = missing.chunks(self.config.chunk_size).collect();
            let fetched = future::try_join_all(chunks.iter().map(|chunk| async move {
                tokio::try_join!(
                    self.service
                        .purchase_order_lines(chunk, &self.config.open_po_statuses),
                    self.service
                        .build_order_lines(chunk, &self.config.open_bo_statuses),
                )
            }))
            .await?;

            for (chunk, (po_lines, bo_lines)) in chunks.iter().zip(fetched) {
                let mut merged: HashMap<PartId, OpenOrders> =
                    chunk.iter().map(|&id| (id, OpenOrders::default())).collect();
                for line in po_lines {
                    if let Some(orders) = merged.get_mut(&line.part) {
                        orders.add_purchase(line.remaining());
                    }
                }
                for line in bo_lines {
                    if let Some(orders) = merged.get_mut(&line.part) {
                        orders.add_build(line.remaining());
                    }
                }
                for (id, orders) in merged {
                    self.open_orders.insert(id, orders);
                }
            }
        }

        Ok(ids
            .iter()
            .map(|id| (*id, self.open_orders.peek(id).unwrap_or_default()))
            .collect())
    }

    /// 批次查詢供應商名稱
    pub async fn supplier_names(
        &self,
        ids: &[PartId],
    ) -> Result<HashMap<PartId, Arc<BTreeSet<String>>>> {
        self.deadline.check()?;
        let missing = self.missing_keys(ids, |id| self.suppliers.peek(id).is_some());

        if !missing.is_empty() {
            let chunks: Vec<&[PartId]> = missing.chunks(self.config.chunk_size).collect();
            let fetched = future::try_join_all(
                chunks
                    .iter()
                    .map(|chunk| async move { self.service.supplier_parts(chunk).await }),
            )
            .await?;

            for (chunk, links) in chunks.iter().zip(fetched) {
                let mut merged: HashMap<PartId, BTreeSet<String>> =
                    chunk.iter().map(|&id| (id, BTreeSet::new())).collect();
                for link in links {
                    if let Some(names) = merged.get_mut(&link.part) {
                        names.insert(link.supplier_name);
                    }
                }
                for (id, names) in merged {
                    self.suppliers.insert(id, Arc::new(names));
                }
            }
        }

        Ok(ids
            .iter()
            .map(|id| {
                let names = self.suppliers.peek(id).unwrap_or_default();
                (*id, names)
            })
            .collect())
    }

    /// 批次查詢製造商名稱（每個零件取第一筆關聯）
    pub async fn manufacturer_names(
        &self,
        ids: &[PartId],
    ) -> Result<HashMap<PartId, Option<Arc<String>>>> {
        self.deadline.check()?;
        let missing = self.missing_keys(ids, |id| self.manufacturers.peek(id).is_some());

        if !missing.is_empty() {
            let chunks: Vec<&[PartId]> = missing.chunks(self.config.chunk_size).collect();
            let fetched = future::try_join_all(
                chunks
                    .iter()
                    .map(|chunk| async move { self.service.manufacturer_parts(chunk).await }),
            )
            .await?;

            for (chunk, links) in chunks.iter().zip(fetched) {
                let mut merged: HashMap<PartId, Option<Arc<String>>> =
                    chunk.iter().map(|&id| (id, None)).collect();
                for link in links {
                    if let Some(slot) = merged.get_mut(&link.part) {
                        if slot.is_none() {
                            *slot = Some(Arc::new(link.manufacturer_name));
                        }
                    }
                }
                for (id, name) in merged {
                    self.manufacturers.insert(id, name);
                }
            }
        }

        Ok(ids
            .iter()
            .map(|id| (*id, self.manufacturers.peek(id).flatten()))
            .collect())
    }

    /// 列出類別下的零件
    pub async fn parts_in_category(&self, category_id: u32) -> Result<Arc<Vec<CatalogEntry>>> {
        self.deadline.check()?;
        let service = &self.service;
        self.catalog
            .get_or_try_fetch(category_id, || async move {
                Ok(Arc::new(service.parts_in_category(category_id).await?))
            })
            .await
    }

    /// 去重後仍缺少快取值的鍵，保持輸入順序
    fn missing_keys(&self, ids: &[PartId], cached: impl Fn(&PartId) -> bool) -> Vec<PartId> {
        let mut seen = HashSet::new();
        ids.iter()
            .copied()
            .filter(|id| seen.insert(*id) && !cached(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryInventory;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn inventory(service: MemoryInventory) -> CachedInventory<MemoryInventory> {
        CachedInventory::new(
            Arc::new(service),
            ServiceConfig::new("http://test.local", "token"),
            Deadline::none(),
        )
    }

    #[tokio::test]
    async fn test_part_meta_is_memoized() {
        let service = MemoryInventory::new()
            .with_part(PartMeta::new(PartId(100), "Rahmen").with_in_stock(dec!(5)));
        let counters = service.counters();
        let cached = inventory(service);

        for _ in 0..4 {
            let meta = cached.part_meta(PartId(100)).await.unwrap().unwrap();
            assert_eq!(meta.in_stock, dec!(5));
        }
        assert_eq!(counters.part_get(), 1);
    }

    #[tokio::test]
    async fn test_not_found_sentinel_is_memoized() {
        let service = MemoryInventory::new();
        let counters = service.counters();
        let cached = inventory(service);

        assert!(cached.part_meta(PartId(9)).await.unwrap().is_none());
        assert!(cached.part_meta(PartId(9)).await.unwrap().is_none());
        assert_eq!(counters.part_get(), 1);

        assert!(matches!(
            cached.require_part_meta(PartId(9)).await,
            Err(OrderError::PartNotFound(PartId(9)))
        ));
    }

    #[tokio::test]
    async fn test_single_flight_on_concurrent_lookup() {
        let service =
            MemoryInventory::new().with_part(PartMeta::new(PartId(7), "Schraube"));
        let counters = service.counters();
        let cached = inventory(service);

        let (a, b) = tokio::join!(cached.part_meta(PartId(7)), cached.part_meta(PartId(7)));
        assert!(a.unwrap().is_some());
        assert!(b.unwrap().is_some());
        assert_eq!(counters.part_get(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_chunks_and_fills_cache() {
        let mut service = MemoryInventory::new();
        for raw in 1..=5u32 {
            service = service.with_part(PartMeta::new(PartId(raw), format!("P-{raw}")));
        }
        let counters = service.counters();

        let mut config = ServiceConfig::new("http://test.local", "token");
        config = config.with_chunk_size(2);
        let cached = CachedInventory::new(Arc::new(service), config, Deadline::none());

        let ids: Vec<PartId> = (1..=5u32).map(PartId).collect();
        cached.prefetch_part_metas(&ids).await.unwrap();

        // 5 個ID、每塊 2 個 → 3 次批次請求
        assert_eq!(counters.part_list(), 3);

        // 之後的單筆查詢不再觸網
        for id in ids {
            assert!(cached.part_meta(id).await.unwrap().is_some());
        }
        assert_eq!(counters.part_get(), 0);
    }

    #[tokio::test]
    async fn test_open_orders_aggregation() {
        let service = MemoryInventory::new()
            .with_part(PartMeta::new(PartId(200), "Blech"))
            .with_purchase_line(PartId(200), dec!(10), dec!(4), 20)
            .with_purchase_line(PartId(200), dec!(3), dec!(0), 10)
            // 已完結的訂單狀態不計入
            .with_purchase_line(PartId(200), dec!(99), dec!(0), 30)
            .with_build_line(PartId(200), dec!(5), dec!(1), 20);
        let cached = inventory(service);

        let orders = cached.open_orders(&[PartId(200)]).await.unwrap();
        let entry = orders.get(&PartId(200)).unwrap();
        assert_eq!(entry.purchase_open, dec!(9));
        assert_eq!(entry.build_in_progress, dec!(4));
    }

    #[tokio::test]
    async fn test_expired_deadline_cancels_lookups() {
        let service = MemoryInventory::new();
        let counters = service.counters();
        let cached = CachedInventory::new(
            Arc::new(service),
            ServiceConfig::new("http://test.local", "token"),
            Deadline::after(Duration::from_secs(0)),
        );

        // DAL 在觸網前觀察期限，合作式回傳 Canceled
        assert!(matches!(
            cached.part_meta(PartId(1)).await,
            Err(OrderError::Canceled)
        ));
        assert!(matches!(
            cached.open_orders(&[PartId(1)]).await,
            Err(OrderError::Canceled)
        ));
        assert_eq!(counters.part_get(), 0);
    }
}
