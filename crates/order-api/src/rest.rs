//! REST 庫存服務客戶端

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use order_core::{
    BomLine, CatalogEntry, OrderError, PartId, PartMeta, Result, ServiceConfig,
};

use crate::service::{
    BuildOrderLine, InventoryService, ManufacturerLink, PurchaseOrderLine, SupplierLink,
};

/// 零件回應紀錄
#[derive(Debug, Deserialize)]
struct PartRecord {
    pk: PartId,
    name: String,
    #[serde(default)]
    assembly: bool,
    #[serde(default)]
    is_template: bool,
    #[serde(default)]
    consumable: bool,
    #[serde(default)]
    in_stock: Decimal,
    #[serde(default)]
    variant_stock: Decimal,
}

impl PartRecord {
    fn into_meta(self) -> PartMeta {
        PartMeta {
            id: self.pk,
            name: self.name,
            is_assembly: self.assembly,
            is_template: self.is_template,
            consumable: self.consumable,
            in_stock: self.in_stock,
            variant_stock: self.variant_stock,
        }
    }
}

/// BOM 行項回應紀錄
#[derive(Debug, Deserialize)]
struct BomItemRecord {
    sub_part: PartId,
    quantity: Decimal,
    #[serde(default = "default_true")]
    allow_variants: bool,
    #[serde(default)]
    consumable: bool,
}

fn default_true() -> bool {
    true
}

/// 外部需求回應紀錄
#[derive(Debug, Default, Deserialize)]
struct RequirementsRecord {
    #[serde(default)]
    required: Decimal,
}

/// 類別目錄回應紀錄
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    pk: PartId,
    name: String,
}

/// InvenTree 相容庫存服務的 REST 客戶端
///
/// 傳輸錯誤與 HTTP 5xx 在此層以指數退避重試；重試耗盡才上拋。
pub struct RestInventory {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl RestInventory {
    /// 以服務配置建立客戶端
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|_| OrderError::Configuration("權杖含有非法字元".into()))?;
        headers.insert(AUTHORIZATION, token);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| OrderError::Transport(format!("無法建立 HTTP 客戶端: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 第 `attempt` 次失敗後的退避延遲（含 ±jitter）
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay.as_secs_f64()
            * 2f64.powi(attempt.saturating_sub(1) as i32);
        let jitter = 1.0 + self.config.retry_jitter * (rand::random::<f64>() * 2.0 - 1.0);
        Duration::from_secs_f64((base * jitter).max(0.0))
    }

    /// GET 請求並解析 JSON；404 回傳 `None`
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = self.endpoint(path);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.client.get(&url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map(Some)
                            .map_err(|e| {
                                OrderError::Transport(format!("回應解析失敗 {url}: {e}"))
                            });
                    }
                    if !status.is_server_error() || attempt >= self.config.retry_attempts {
                        return Err(OrderError::Transport(format!("HTTP {status}: {url}")));
                    }
                    tracing::warn!("HTTP {} ({}), 第 {} 次嘗試後重試", status, url, attempt);
                }
                Err(e) => {
                    if attempt >= self.config.retry_attempts {
                        return Err(OrderError::Transport(format!("請求失敗 {url}: {e}")));
                    }
                    tracing::warn!("請求失敗 ({}), 第 {} 次嘗試後重試: {}", url, attempt, e);
                }
            }
            tokio::time::sleep(self.backoff_delay(attempt)).await;
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        Ok(self.get_json(path, query).await?.unwrap_or_default())
    }
}

fn join_ids(ids: &[PartId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn join_statuses(statuses: &[i32]) -> String {
    statuses
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl InventoryService for RestInventory {
    async fn part_get(&self, id: PartId) -> Result<Option<PartMeta>> {
        let record: Option<PartRecord> = self.get_json(&format!("part/{id}/"), &[]).await?;
        Ok(record.map(PartRecord::into_meta))
    }

    async fn part_list(&self, ids: &[PartId]) -> Result<Vec<PartMeta>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<PartRecord> = self
            .get_list("part/", &[("pk__in", join_ids(ids))])
            .await?;
        Ok(records.into_iter().map(PartRecord::into_meta).collect())
    }

    async fn parts_in_category(&self, category_id: u32) -> Result<Vec<CatalogEntry>> {
        let records: Vec<CatalogRecord> = self
            .get_list("part/", &[("category", category_id.to_string())])
            .await?;
        let mut entries: Vec<CatalogEntry> = records
            .into_iter()
            .map(|r| CatalogEntry {
                id: r.pk,
                name: r.name,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn bom_items(&self, parent_id: PartId) -> Result<Vec<BomLine>> {
        let records: Vec<BomItemRecord> = self
            .get_list("bom/", &[("part", parent_id.to_string())])
            .await?;
        Ok(records
            .into_iter()
            .map(|r| BomLine {
                parent_id,
                sub_part_id: r.sub_part,
                quantity_per: r.quantity,
                allow_variants: r.allow_variants,
                consumable: r.consumable,
            })
            .collect())
    }

    async fn part_requirements(&self, id: PartId) -> Result<Decimal> {
        let record: Option<RequirementsRecord> = self
            .get_json(&format!("part/{id}/requirements/"), &[])
            .await?;
        Ok(record.unwrap_or_default().required)
    }

    async fn purchase_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<PurchaseOrderLine>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_list(
            "order/po-line/",
            &[
                ("part__in", join_ids(ids)),
                ("order_status__in", join_statuses(statuses)),
            ],
        )
        .await
    }

    async fn build_order_lines(
        &self,
        ids: &[PartId],
        statuses: &[i32],
    ) -> Result<Vec<BuildOrderLine>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_list(
            "build/",
            &[
                ("part__in", join_ids(ids)),
                ("status__in", join_statuses(statuses)),
            ],
        )
        .await
    }

    async fn supplier_parts(&self, ids: &[PartId]) -> Result<Vec<SupplierLink>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_list("company/part/", &[("part__in", join_ids(ids))])
            .await
    }

    async fn manufacturer_parts(&self, ids: &[PartId]) -> Result<Vec<ManufacturerLink>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_list("company/part/manufacturer/", &[("part__in", join_ids(ids))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServiceConfig {
        ServiceConfig::new("http://inventree.local/", "test-token")
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let rest = RestInventory::new(test_config()).unwrap();
        assert_eq!(
            rest.endpoint("part/191/"),
            "http://inventree.local/api/part/191/"
        );
    }

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[PartId(1), PartId(20), PartId(3)]), "1,20,3");
        assert_eq!(join_ids(&[]), "");
    }

    #[test]
    fn test_backoff_delay_within_jitter_band() {
        let rest = RestInventory::new(test_config()).unwrap();
        for attempt in 1..=3u32 {
            let base = 0.5 * 2f64.powi(attempt as i32 - 1);
            for _ in 0..50 {
                let delay = rest.backoff_delay(attempt).as_secs_f64();
                assert!(delay >= base * 0.8 - 1e-9);
                assert!(delay <= base * 1.2 + 1e-9);
            }
        }
    }

    #[test]
    fn test_part_record_defaults() {
        let record: PartRecord =
            serde_json::from_str(r#"{"pk": 100, "name": "Gehäuse"}"#).unwrap();
        let meta = record.into_meta();
        assert_eq!(meta.id, PartId(100));
        assert!(!meta.is_assembly);
        assert_eq!(meta.in_stock, Decimal::ZERO);
    }

    #[test]
    fn test_bom_item_allow_variants_defaults_true() {
        let record: BomItemRecord =
            serde_json::from_str(r#"{"sub_part": 200, "quantity": "2.5"}"#).unwrap();
        assert!(record.allow_variants);
        assert!(!record.consumable);
    }
}
