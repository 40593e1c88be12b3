//! # Order Core
//!
//! 核心資料模型與類型定義

pub mod bom;
pub mod config;
pub mod deadline;
pub mod demand;
pub mod orders;
pub mod part;
pub mod report;

// Re-export 主要類型
pub use bom::BomLine;
pub use config::{CalcOptions, ServiceConfig};
pub use deadline::Deadline;
pub use demand::Demand;
pub use orders::OpenOrders;
pub use part::{BomPath, CatalogEntry, PartId, PartMeta};
pub use report::{BuildLine, OrderLine};

/// 計算錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("配置錯誤: {0}")]
    Configuration(String),

    #[error("傳輸錯誤: {0}")]
    Transport(String),

    #[error("找不到零件: {0}")]
    PartNotFound(PartId),

    #[error("資料錯誤: {0}")]
    Data(String),

    #[error("BOM 圖存在迴圈: {0}")]
    CycleDetected(BomPath),

    #[error("輸入驗證失敗: {0}")]
    Validation(String),

    #[error("計算已取消")]
    Canceled,

    #[error("超過計算期限")]
    DeadlineExceeded,
}

impl OrderError {
    /// 非互動模式下的程序結束碼
    ///
    /// 0 = 成功、2 = 配置錯誤、3 = 傳輸錯誤、4 = 資料錯誤、5 = 取消/逾時
    pub fn exit_code(&self) -> i32 {
        match self {
            OrderError::Configuration(_) => 2,
            OrderError::Transport(_) => 3,
            OrderError::PartNotFound(_)
            | OrderError::Data(_)
            | OrderError::CycleDetected(_)
            | OrderError::Validation(_) => 4,
            OrderError::Canceled | OrderError::DeadlineExceeded => 5,
        }
    }

    /// 檢查是否為可重試的傳輸層錯誤
    pub fn is_transport(&self) -> bool {
        matches!(self, OrderError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
