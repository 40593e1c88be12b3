//! 訂單需求計算的命令列入口
//!
//! 從環境變數讀取服務配置，執行一輪計算後輸出採購與生產建議。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rust_decimal::Decimal;

use order_api::{InventoryService, RestInventory};
use order_calc::{export, CalcResult, ExclusionFilter, OrderCalculator};
use order_core::{CalcOptions, Deadline, Demand, OrderError, PartId, Result, ServiceConfig};

#[derive(Debug, Parser)]
#[command(name = "order-cli", about = "計算目標組件的採購與生產需求", version)]
struct Cli {
    /// 目標組件與數量，格式 ID=數量（可重複）
    #[arg(long = "target", value_name = "ID=QTY")]
    targets: Vec<String>,

    /// 排除此供應商的零件（可重複）
    #[arg(long = "exclude-supplier", value_name = "NAME")]
    exclude_suppliers: Vec<String>,

    /// 排除此製造商的零件（可重複）
    #[arg(long = "exclude-manufacturer", value_name = "NAME")]
    exclude_manufacturers: Vec<String>,

    /// 整輪計算的期限（秒）
    #[arg(long = "deadline-secs", value_name = "SECS")]
    deadline_secs: Option<u64>,

    /// 採購建議 CSV 輸出路徑
    #[arg(long = "orders-csv", value_name = "PATH")]
    orders_csv: Option<PathBuf>,

    /// 生產建議 CSV 輸出路徑
    #[arg(long = "builds-csv", value_name = "PATH")]
    builds_csv: Option<PathBuf>,

    /// 列出目標類別下的候選組件後結束
    #[arg(long = "list-targets")]
    list_targets: bool,

    /// 生產中數量計入子組件可用量
    #[arg(long = "count-in-progress")]
    count_in_progress: bool,

    /// 排除耗材行項的用量
    #[arg(long = "exclude-consumables")]
    exclude_consumables: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("錯誤: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServiceConfig::from_env()?;
    let service = Arc::new(RestInventory::new(config.clone())?);

    if cli.list_targets {
        return list_targets(&config, service.as_ref()).await;
    }

    let demands = parse_targets(&cli.targets)?;
    if demands.is_empty() {
        return Err(OrderError::Validation(
            "請以 --target ID=數量 指定至少一個目標組件".into(),
        ));
    }

    let mut filter = ExclusionFilter::none();
    for name in &cli.exclude_suppliers {
        filter = filter.exclude_supplier(name);
    }
    for name in &cli.exclude_manufacturers {
        filter = filter.exclude_manufacturer(name);
    }

    let mut options = CalcOptions::default();
    if cli.count_in_progress {
        options = options.counting_in_progress_builds();
    }
    if cli.exclude_consumables {
        options = options.without_consumables();
    }

    let deadline = match cli.deadline_secs {
        Some(secs) => Deadline::after(Duration::from_secs(secs)),
        None => Deadline::none(),
    };

    let calculator = OrderCalculator::new(service, config).with_options(options);
    let result = calculator.compute(&demands, &filter, deadline).await?;

    report(&result, cli.orders_csv.as_deref(), cli.builds_csv.as_deref())
}

/// 解析 `--target ID=數量` 參數
fn parse_targets(raw_targets: &[String]) -> Result<Vec<Demand>> {
    let mut demands = Vec::with_capacity(raw_targets.len());
    for raw in raw_targets {
        let (id_part, qty_part) = raw.split_once('=').ok_or_else(|| {
            OrderError::Validation(format!("無效的目標格式（預期 ID=數量）: {raw}"))
        })?;
        let root_id: PartId = id_part
            .parse()
            .map_err(|_| OrderError::Validation(format!("無效的零件ID: {id_part}")))?;
        let quantity: Decimal = qty_part
            .trim()
            .parse()
            .map_err(|_| OrderError::Validation(format!("無效的數量: {qty_part}")))?;
        demands.push(Demand::new(root_id, quantity));
    }
    Ok(demands)
}

async fn list_targets(config: &ServiceConfig, service: &RestInventory) -> Result<()> {
    let category_id = config.category_id.ok_or_else(|| {
        OrderError::Configuration(format!(
            "缺少環境變數 {}，無法列出候選組件",
            order_core::config::ENV_CATEGORY_ID
        ))
    })?;

    let entries = service.parts_in_category(category_id).await?;
    for entry in &entries {
        println!("{}\t{}", entry.id, entry.name);
    }
    tracing::info!("類別 {} 共 {} 個候選組件", category_id, entries.len());
    Ok(())
}

fn report(
    result: &CalcResult,
    orders_csv: Option<&std::path::Path>,
    builds_csv: Option<&std::path::Path>,
) -> Result<()> {
    for warning in &result.warnings {
        tracing::warn!("{}", warning.message);
    }

    let orders = export::order_lines_csv(&result.order_lines)?;
    let builds = export::build_lines_csv(&result.build_lines)?;

    match orders_csv {
        Some(path) => {
            std::fs::write(path, &orders)
                .map_err(|e| OrderError::Data(format!("無法寫入 {}: {e}", path.display())))?;
            tracing::info!("採購建議已寫入 {}", path.display());
        }
        None => {
            println!("# 採購建議 ({} 筆)", result.order_lines.len());
            print!("{orders}");
        }
    }

    match builds_csv {
        Some(path) => {
            std::fs::write(path, &builds)
                .map_err(|e| OrderError::Data(format!("無法寫入 {}: {e}", path.display())))?;
            tracing::info!("生產建議已寫入 {}", path.display());
        }
        None => {
            println!("# 生產建議 ({} 筆)", result.build_lines.len());
            print!("{builds}");
        }
    }

    if result.order_lines.is_empty() && result.build_lines.is_empty() {
        println!("# 所有需求均由庫存與在途訂單滿足");
    }
    Ok(())
}
