//! 計算協調器

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use order_api::{CachedInventory, InventoryService};
use order_core::{CalcOptions, Deadline, Demand, OrderError, PartId, Result, ServiceConfig};

use crate::aggregate::{self, ExclusionFilter, PartFacts};
use crate::stock::{pooled_variant_stock, StockView};
use crate::traversal::BomWalker;
use crate::{CalcResult, CalcWarning};

/// 訂單需求計算器
///
/// 單一入口 [`OrderCalculator::compute`]：驅動 DAL 預取、兩個遍歷
/// pass 與彙總，回傳採購與生產兩份建議清單。
pub struct OrderCalculator<S> {
    service: Arc<S>,
    config: ServiceConfig,
    options: CalcOptions,
}

impl<S: InventoryService> OrderCalculator<S> {
    /// 創建新的計算器
    pub fn new(service: Arc<S>, config: ServiceConfig) -> Self {
        Self {
            service,
            config,
            options: CalcOptions::default(),
        }
    }

    /// 建構器模式：設置計算選項
    pub fn with_options(mut self, options: CalcOptions) -> Self {
        self.options = options;
        self
    }

    /// 主計算入口
    ///
    /// 相同輸入與相同服務狀態下輸出完全一致；任何致命錯誤
    /// 直接中斷整輪計算，不回傳部分結果。
    pub async fn compute(
        &self,
        demands: &[Demand],
        filter: &ExclusionFilter,
        deadline: Deadline,
    ) -> Result<CalcResult> {
        match self.run(demands, filter, deadline).await {
            // DAL 與遍歷引擎以 `Canceled` 合作式中止；期限引起的取消
            // 在最外層回報為逾時
            Err(OrderError::Canceled) if deadline.is_expired() => {
                Err(OrderError::DeadlineExceeded)
            }
            other => other,
        }
    }

    async fn run(
        &self,
        demands: &[Demand],
        filter: &ExclusionFilter,
        deadline: Deadline,
    ) -> Result<CalcResult> {
        if demands.is_empty() {
            return Ok(CalcResult::empty());
        }

        tracing::info!("開始訂單需求計算：目標 {} 筆", demands.len());
        let start_time = std::time::Instant::now();

        let inventory = CachedInventory::new(
            Arc::clone(&self.service),
            self.config.clone(),
            deadline,
        );

        // Step 1: 驗證輸入
        tracing::debug!("Step 1: 驗證目標組件");
        self.validate(&inventory, demands).await?;

        // Step 2: Pass 1 毛需求展開
        tracing::debug!("Step 2: Pass 1 毛需求展開");
        let walker = BomWalker::new(&inventory, self.options);
        let gross = walker.run_gross(demands).await?;
        tracing::debug!(
            "Pass 1 完成：基礎零件 {} 項、子組件 {} 項、遭遇零件 {} 項",
            gross.base.len(),
            gross.assemblies.len(),
            gross.encountered.len()
        );

        // Step 3: 批次補齊零件事實
        tracing::debug!("Step 3: 批次查詢外部需求與在途訂單");
        let ids: Vec<PartId> = gross.encountered.iter().copied().collect();
        let (required_map, orders_map) = tokio::try_join!(
            inventory.external_required(&ids),
            inventory.open_orders(&ids),
        )?;

        let mut warnings = Vec::new();
        for id in &gross.empty_bom_assemblies {
            let meta = inventory.require_part_meta(*id).await?;
            warnings.push(CalcWarning::info(
                *id,
                format!("組件 {} 的 BOM 為空", meta.name),
            ));
        }

        // 供應商/製造商只供顯示過濾，傳輸失敗降級為警告
        let (suppliers_map, manufacturers_map) = match tokio::try_join!(
            inventory.supplier_names(&ids),
            inventory.manufacturer_names(&ids),
        ) {
            Ok(maps) => maps,
            Err(e) if e.is_transport() => {
                tracing::warn!("供應商/製造商查詢失敗: {}", e);
                warnings.push(CalcWarning::warning(format!(
                    "供應商/製造商查詢失敗，排除過濾可能不完整: {e}"
                )));
                (HashMap::new(), HashMap::new())
            }
            Err(e) => return Err(e),
        };

        // Step 4: 建立零件事實與庫存視圖
        tracing::debug!("Step 4: 建立庫存視圖");
        let mut facts: HashMap<PartId, PartFacts> = HashMap::with_capacity(ids.len());
        for id in &ids {
            let meta = inventory.require_part_meta(*id).await?;
            let pooled_variant = pooled_variant_stock(&meta, &gross.template_only);
            facts.insert(
                *id,
                PartFacts {
                    required: required_map.get(id).copied().unwrap_or(Decimal::ZERO),
                    orders: orders_map.get(id).copied().unwrap_or_default(),
                    suppliers: suppliers_map.get(id).cloned().unwrap_or_default(),
                    manufacturer: manufacturers_map.get(id).cloned().flatten(),
                    pooled_variant,
                    meta,
                },
            );
        }

        let mut stock = StockView::new();
        for id in gross.assemblies.keys() {
            let part = facts
                .get(id)
                .ok_or_else(|| OrderError::Data(format!("零件 {id} 缺少庫存事實")))?;
            let mut available = part.available();
            if self.options.count_in_progress_builds {
                available += part.orders.build_in_progress;
            }
            stock.set(*id, available);
        }

        // Step 5: Pass 2 淨需求展開
        tracing::debug!("Step 5: Pass 2 淨需求展開");
        let net = walker.run_net(demands, &mut stock).await?;
        tracing::debug!("Pass 2 完成：淨基礎零件 {} 項", net.base.len());

        // Step 6: 彙總與過濾
        tracing::debug!("Step 6: 彙總結果");
        let (order_lines, build_lines) = aggregate::build_report(&gross, &net, &facts, filter)?;

        let mut result = CalcResult::empty();
        result.order_lines = order_lines;
        result.build_lines = build_lines;
        result.warnings = warnings;
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "計算完成，耗時 {:?}：採購 {} 筆、生產 {} 筆、警告 {} 則",
            start_time.elapsed(),
            result.order_lines.len(),
            result.build_lines.len(),
            result.warnings.len()
        );
        Ok(result)
    }

    async fn validate(
        &self,
        inventory: &CachedInventory<S>,
        demands: &[Demand],
    ) -> Result<()> {
        for demand in demands {
            if demand.quantity <= Decimal::ZERO {
                return Err(OrderError::Validation(format!(
                    "目標組件 {} 的數量必須為正",
                    demand.root_id
                )));
            }
            let meta = inventory.require_part_meta(demand.root_id).await?;
            if !meta.is_assembly {
                return Err(OrderError::Validation(format!(
                    "目標零件 {} ({}) 不是組件",
                    meta.name, demand.root_id
                )));
            }
        }
        Ok(())
    }
}
