//! BOM 遍歷引擎

use std::collections::{BTreeSet, HashMap, HashSet};

use futures::future::{self, BoxFuture};
use rust_decimal::Decimal;

use order_api::{CachedInventory, InventoryService};
use order_core::{BomLine, BomPath, CalcOptions, Demand, OrderError, PartId, Result};

use crate::stock::StockView;

/// Pass 1 輸出：忽略庫存的毛需求
#[derive(Debug, Default)]
pub struct GrossOutcome {
    /// 基礎零件毛需求
    pub base: HashMap<PartId, Decimal>,

    /// 子組件毛需求（不含目標組件本身）
    pub assemblies: HashMap<PartId, Decimal>,

    /// 每個基礎零件首次被需求的目標組件
    pub origin_roots: HashMap<PartId, PartId>,

    /// 遍歷中遭遇的所有零件（供批次查詢）
    pub encountered: BTreeSet<PartId>,

    /// 本輪停用變體庫存抵用的模板零件
    pub template_only: HashSet<PartId>,

    /// BOM 為空的組件（診斷用）
    pub empty_bom_assemblies: BTreeSet<PartId>,
}

/// Pass 2 輸出：扣除子組件庫存後的淨需求
#[derive(Debug, Default)]
pub struct NetOutcome {
    /// 基礎零件淨需求
    pub base: HashMap<PartId, Decimal>,

    /// 每個基礎零件首次被需求的目標組件
    pub origin_roots: HashMap<PartId, PartId>,

    /// 子組件的未滿足缺口（記帳用）
    pub shortfalls: HashMap<PartId, Decimal>,
}

/// 遞迴 BOM 遍歷器
///
/// 同一輪計算的兩個 pass 共用一個實例；所有零件事實經由
/// 記憶化的 DAL 取得，重複查詢不觸網。
pub struct BomWalker<'a, S> {
    inventory: &'a CachedInventory<S>,
    options: CalcOptions,
}

impl<'a, S: InventoryService> BomWalker<'a, S> {
    /// 創建新的遍歷器
    pub fn new(inventory: &'a CachedInventory<S>, options: CalcOptions) -> Self {
        Self { inventory, options }
    }

    /// Pass 1：按輸入順序展開每筆需求，累加毛需求
    pub async fn run_gross(&self, demands: &[Demand]) -> Result<GrossOutcome> {
        let mut out = GrossOutcome::default();
        for demand in demands {
            tracing::debug!("Pass 1: 展開目標組件 {} × {}", demand.root_id, demand.quantity);
            let mut path = Vec::new();
            self.walk_gross(demand.root_id, demand.quantity, demand.root_id, &mut path, &mut out)
                .await?;
        }
        Ok(out)
    }

    /// Pass 2：同樣的展開，但子組件需求先抵扣庫存視圖
    pub async fn run_net(
        &self,
        demands: &[Demand],
        stock: &mut StockView,
    ) -> Result<NetOutcome> {
        let mut out = NetOutcome::default();
        for demand in demands {
            tracing::debug!("Pass 2: 展開目標組件 {} × {}", demand.root_id, demand.quantity);
            let mut path = Vec::new();
            self.walk_net(
                demand.root_id,
                demand.quantity,
                demand.root_id,
                &mut path,
                stock,
                &mut out,
            )
            .await?;
        }
        Ok(out)
    }

    fn walk_gross<'b>(
        &'b self,
        part_id: PartId,
        multiplier: Decimal,
        root_id: PartId,
        path: &'b mut Vec<PartId>,
        out: &'b mut GrossOutcome,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            self.inventory.deadline().check()?;
            out.encountered.insert(part_id);

            let meta = self.inventory.require_part_meta(part_id).await?;
            if !meta.is_assembly {
                *out.base.entry(part_id).or_insert(Decimal::ZERO) += multiplier;
                out.origin_roots.entry(part_id).or_insert(root_id);
                return Ok(());
            }

            self.enter(part_id, path)?;
            let lines = self.inventory.bom_lines(part_id).await?;
            if lines.is_empty() {
                out.empty_bom_assemblies.insert(part_id);
                path.pop();
                return Ok(());
            }
            self.prefetch_children(lines.as_slice()).await?;

            for line in lines.iter() {
                let quantity = multiplier * self.checked_quantity_per(line)?;
                let sub_id = line.sub_part_id;
                let sub_meta = self.inventory.require_part_meta(sub_id).await?;

                if self.skip_consumable(line, &sub_meta) {
                    tracing::debug!("略過耗材行項: {} → {}", part_id, sub_id);
                    continue;
                }

                out.encountered.insert(sub_id);
                if sub_meta.is_template && !line.allow_variants {
                    out.template_only.insert(sub_id);
                }

                if sub_meta.is_assembly {
                    *out.assemblies.entry(sub_id).or_insert(Decimal::ZERO) += quantity;
                    tracing::debug!(
                        "子組件: {} ({}), 毛需求 {}",
                        sub_meta.name,
                        sub_id,
                        quantity
                    );
                    self.walk_gross(sub_id, quantity, root_id, path, out).await?;
                } else {
                    *out.base.entry(sub_id).or_insert(Decimal::ZERO) += quantity;
                    out.origin_roots.entry(sub_id).or_insert(root_id);
                    tracing::debug!(
                        "基礎零件: {} ({}), 毛需求 {}",
                        sub_meta.name,
                        sub_id,
                        quantity
                    );
                }
            }

            path.pop();
            Ok(())
        })
    }

    fn walk_net<'b>(
        &'b self,
        part_id: PartId,
        multiplier: Decimal,
        root_id: PartId,
        path: &'b mut Vec<PartId>,
        stock: &'b mut StockView,
        out: &'b mut NetOutcome,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            self.inventory.deadline().check()?;

            let meta = self.inventory.require_part_meta(part_id).await?;
            if !meta.is_assembly {
                *out.base.entry(part_id).or_insert(Decimal::ZERO) += multiplier;
                out.origin_roots.entry(part_id).or_insert(root_id);
                return Ok(());
            }

            self.enter(part_id, path)?;
            let lines = self.inventory.bom_lines(part_id).await?;

            for line in lines.iter() {
                let quantity = multiplier * self.checked_quantity_per(line)?;
                let sub_id = line.sub_part_id;
                let sub_meta = self.inventory.require_part_meta(sub_id).await?;

                if self.skip_consumable(line, &sub_meta) {
                    continue;
                }

                if sub_meta.is_assembly {
                    // 可用量在路徑之間共享：先到先扣，後到只見餘量
                    let shortfall = stock.consume(sub_id, quantity);
                    if shortfall > Decimal::ZERO {
                        *out.shortfalls.entry(sub_id).or_insert(Decimal::ZERO) += shortfall;
                        tracing::debug!(
                            "子組件 {} ({}): 需求 {}, 缺口 {}, 遞迴展開",
                            sub_meta.name,
                            sub_id,
                            quantity,
                            shortfall
                        );
                        self.walk_net(sub_id, shortfall, root_id, path, stock, out)
                            .await?;
                    } else {
                        tracing::debug!(
                            "子組件 {} ({}): 需求 {} 由庫存滿足，剪枝",
                            sub_meta.name,
                            sub_id,
                            quantity
                        );
                    }
                } else {
                    *out.base.entry(sub_id).or_insert(Decimal::ZERO) += quantity;
                    out.origin_roots.entry(sub_id).or_insert(root_id);
                }
            }

            path.pop();
            Ok(())
        })
    }

    /// 迴圈偵測後把節點壓入目前路徑
    fn enter(&self, part_id: PartId, path: &mut Vec<PartId>) -> Result<()> {
        if path.contains(&part_id) {
            let mut cycle = path.clone();
            cycle.push(part_id);
            return Err(OrderError::CycleDetected(BomPath(cycle)));
        }
        path.push(part_id);
        Ok(())
    }

    fn checked_quantity_per(&self, line: &BomLine) -> Result<Decimal> {
        if line.quantity_per <= Decimal::ZERO {
            return Err(OrderError::Data(format!(
                "BOM 行項用量必須為正: {} → {}",
                line.parent_id, line.sub_part_id
            )));
        }
        Ok(line.quantity_per)
    }

    fn skip_consumable(&self, line: &BomLine, sub_meta: &order_core::PartMeta) -> bool {
        !self.options.include_consumables && (line.consumable || sub_meta.consumable)
    }

    /// 進入子節點前並行預取下一層的零件快照與 BOM
    ///
    /// 累加仍按行項順序序列化，輸出與序列遍歷完全一致。
    async fn prefetch_children(&self, lines: &[BomLine]) -> Result<()> {
        let sub_ids: Vec<PartId> = lines.iter().map(|l| l.sub_part_id).collect();
        self.inventory.prefetch_part_metas(&sub_ids).await?;

        let mut assembly_ids = Vec::new();
        for id in sub_ids {
            if let Some(meta) = self.inventory.part_meta(id).await? {
                if meta.is_assembly {
                    assembly_ids.push(id);
                }
            }
        }
        future::try_join_all(assembly_ids.iter().map(|&id| self.inventory.bom_lines(id)))
            .await?;
        Ok(())
    }
}
