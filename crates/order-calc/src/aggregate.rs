//! 需求彙總與結果列生成

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;

use order_core::{BuildLine, OpenOrders, OrderError, OrderLine, PartId, PartMeta, Result};

use crate::traversal::{GrossOutcome, NetOutcome};

/// 零值過濾門檻
fn epsilon() -> Decimal {
    Decimal::new(1, 3)
}

/// 單一零件在本輪計算中的全部事實
#[derive(Debug, Clone)]
pub struct PartFacts {
    /// 零件快照
    pub meta: Arc<PartMeta>,

    /// 外部已承諾需求
    pub required: Decimal,

    /// 在途訂單
    pub orders: OpenOrders,

    /// 供應商名稱
    pub suppliers: Arc<BTreeSet<String>>,

    /// 製造商名稱
    pub manufacturer: Option<Arc<String>>,

    /// 可抵用的變體庫存（已套用全輪模板規則）
    pub pooled_variant: Decimal,
}

impl PartFacts {
    /// 可用庫存：現有庫存加可抵用變體庫存，扣除外部承諾
    pub fn available(&self) -> Decimal {
        self.meta.in_stock + self.pooled_variant - self.required
    }
}

/// 顯示層排除過濾器
///
/// 在決策完成後套用：被排除的零件自輸出清單消失，數字不重算。
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    suppliers: Vec<String>,
    manufacturers: Vec<String>,
}

impl ExclusionFilter {
    /// 不排除任何零件
    pub fn none() -> Self {
        Self::default()
    }

    /// 建構器模式：排除供應商
    pub fn exclude_supplier(mut self, name: impl Into<String>) -> Self {
        self.suppliers.push(name.into());
        self
    }

    /// 建構器模式：排除製造商
    pub fn exclude_manufacturer(mut self, name: impl Into<String>) -> Self {
        self.manufacturers.push(name.into());
        self
    }

    /// 檢查零件是否被排除
    pub fn excludes(&self, facts: &PartFacts) -> bool {
        if self.suppliers.iter().any(|s| facts.suppliers.contains(s)) {
            return true;
        }
        match &facts.manufacturer {
            Some(name) => self.manufacturers.iter().any(|m| m == name.as_ref()),
            None => false,
        }
    }
}

/// 把兩個 pass 的輸出轉成採購與生產建議
///
/// 採購列以淨需求對可用庫存與在途採購結算，生產列以毛需求對
/// 可用庫存與生產中數量結算；零列被過濾，輸出按名稱排序。
pub fn build_report(
    gross: &GrossOutcome,
    net: &NetOutcome,
    facts: &HashMap<PartId, PartFacts>,
    filter: &ExclusionFilter,
) -> Result<(Vec<OrderLine>, Vec<BuildLine>)> {
    let mut order_lines = Vec::new();

    let mut base_ids: BTreeSet<PartId> = gross.base.keys().copied().collect();
    base_ids.extend(net.base.keys().copied());

    for id in base_ids {
        let part = require_facts(facts, id)?;
        let required = net.base.get(&id).copied().unwrap_or(Decimal::ZERO);
        let available = part.available();
        let on_order = part.orders.purchase_open;
        let to_order = (required - available - on_order).max(Decimal::ZERO);

        if to_order <= epsilon() {
            continue;
        }
        if filter.excludes(part) {
            tracing::debug!("排除零件 {} ({})", part.meta.name, id);
            continue;
        }

        let root_id = net
            .origin_roots
            .get(&id)
            .or_else(|| gross.origin_roots.get(&id))
            .copied()
            .ok_or_else(|| OrderError::Data(format!("零件 {id} 缺少需求來源")))?;
        let root_name = require_facts(facts, root_id)?.meta.name.clone();

        order_lines.push(OrderLine {
            part_id: id,
            name: part.meta.name.clone(),
            required,
            available,
            on_order,
            to_order,
            root_id,
            root_name,
        });
    }

    let mut build_lines = Vec::new();
    for (&id, &total_needed) in &gross.assemblies {
        let part = require_facts(facts, id)?;
        let available = part.available();
        let in_progress = part.orders.build_in_progress;
        let to_build = (total_needed - available - in_progress).max(Decimal::ZERO);

        if to_build <= epsilon() {
            continue;
        }
        if filter.excludes(part) {
            tracing::debug!("排除子組件 {} ({})", part.meta.name, id);
            continue;
        }

        build_lines.push(BuildLine {
            part_id: id,
            name: part.meta.name.clone(),
            total_needed,
            in_stock: part.meta.in_stock,
            in_progress,
            available,
            to_build,
        });
    }

    sort_by_name(&mut order_lines, |l| (&l.name, l.part_id));
    sort_by_name(&mut build_lines, |l| (&l.name, l.part_id));

    Ok((order_lines, build_lines))
}

fn require_facts(facts: &HashMap<PartId, PartFacts>, id: PartId) -> Result<&PartFacts> {
    facts
        .get(&id)
        .ok_or_else(|| OrderError::Data(format!("零件 {id} 缺少庫存事實")))
}

/// 名稱不分大小寫排序，同名以零件ID遞增決勝
fn sort_by_name<T, F>(rows: &mut [T], key: F)
where
    F: Fn(&T) -> (&String, PartId),
{
    rows.sort_by(|a, b| {
        let (name_a, id_a) = key(a);
        let (name_b, id_b) = key(b);
        name_a
            .to_lowercase()
            .cmp(&name_b.to_lowercase())
            .then(id_a.cmp(&id_b))
    });
}
