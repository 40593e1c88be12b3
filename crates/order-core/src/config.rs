//! 服務與計算配置

use std::env;
use std::time::Duration;

use crate::{OrderError, Result};

/// 環境變數：庫存服務位址
pub const ENV_SERVICE_URL: &str = "INVENTREE_URL";
/// 環境變數：庫存服務存取權杖
pub const ENV_SERVICE_TOKEN: &str = "INVENTREE_TOKEN";
/// 環境變數：目標組件類別ID
pub const ENV_CATEGORY_ID: &str = "INVENTREE_CATEGORY";

/// 庫存服務連線配置
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 服務基礎 URL
    pub base_url: String,

    /// API 權杖
    pub token: String,

    /// 目標組件類別ID（選擇介面的範圍）
    pub category_id: Option<u32>,

    /// 單次請求逾時
    pub request_timeout: Duration,

    /// 傳輸錯誤重試次數
    pub retry_attempts: u32,

    /// 重試基礎延遲（指數退避的起點）
    pub retry_base_delay: Duration,

    /// 重試延遲抖動比例（0.2 = ±20%）
    pub retry_jitter: f64,

    /// 批次請求的分塊大小
    pub chunk_size: usize,

    /// 視為「在途」的採購訂單狀態碼
    pub open_po_statuses: Vec<i32>,

    /// 視為「在途」的生產工單狀態碼
    pub open_bo_statuses: Vec<i32>,
}

impl ServiceConfig {
    /// 創建新的服務配置
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            category_id: None,
            request_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_jitter: 0.2,
            chunk_size: 100,
            // 10 = Pending, 20 = Placed/Production, 25 = On Hold
            open_po_statuses: vec![10, 20, 25],
            open_bo_statuses: vec![10, 20, 25],
        }
    }

    /// 從環境變數讀取配置
    ///
    /// URL 或權杖缺失會直接中止啟動；類別ID為選填，但格式錯誤視為配置錯誤。
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(ENV_SERVICE_URL)
            .map_err(|_| OrderError::Configuration(format!("缺少環境變數 {ENV_SERVICE_URL}")))?;
        let token = env::var(ENV_SERVICE_TOKEN)
            .map_err(|_| OrderError::Configuration(format!("缺少環境變數 {ENV_SERVICE_TOKEN}")))?;

        let category_id = match env::var(ENV_CATEGORY_ID) {
            Ok(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                OrderError::Configuration(format!("無效的類別ID: {raw}"))
            })?),
            Err(_) => None,
        };

        let mut config = Self::new(base_url, token);
        config.category_id = category_id;
        Ok(config)
    }

    /// 建構器模式：設置類別ID
    pub fn with_category_id(mut self, category_id: u32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// 建構器模式：設置請求逾時
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 建構器模式：設置在途採購訂單狀態碼
    pub fn with_open_po_statuses(mut self, statuses: Vec<i32>) -> Self {
        self.open_po_statuses = statuses;
        self
    }

    /// 建構器模式：設置在途生產工單狀態碼
    pub fn with_open_bo_statuses(mut self, statuses: Vec<i32>) -> Self {
        self.open_bo_statuses = statuses;
        self
    }

    /// 建構器模式：設置批次分塊大小
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// 單次計算的行為選項
#[derive(Debug, Clone, Copy)]
pub struct CalcOptions {
    /// 是否計入耗材行項的用量
    pub include_consumables: bool,

    /// NET 遍歷時是否將生產中數量計入子組件可用量
    ///
    /// 關閉時生產中數量僅作為結果列的顯示欄位。
    pub count_in_progress_builds: bool,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            include_consumables: true,
            count_in_progress_builds: false,
        }
    }
}

impl CalcOptions {
    /// 建構器模式：排除耗材用量
    pub fn without_consumables(mut self) -> Self {
        self.include_consumables = false;
        self
    }

    /// 建構器模式：將生產中數量計入可用量
    pub fn counting_in_progress_builds(mut self) -> Self {
        self.count_in_progress_builds = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_defaults() {
        let config = ServiceConfig::new("http://inventree.local", "token");

        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.open_po_statuses, vec![10, 20, 25]);
        assert!(config.category_id.is_none());
    }

    #[test]
    fn test_calc_options_defaults() {
        let options = CalcOptions::default();
        assert!(options.include_consumables);
        assert!(!options.count_in_progress_builds);

        let options = options.without_consumables().counting_in_progress_builds();
        assert!(!options.include_consumables);
        assert!(options.count_in_progress_builds);
    }
}
