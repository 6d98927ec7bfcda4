//! 日志工具模块
//!
//! 初始化 tracing，并提供运行期各阶段的日志输出辅助函数

use std::fs;
use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AppError, AppResult};
use crate::models::{BatchRun, MonthOutcome, RunSummary, StageType, YearMonth};

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=procurement_submit=debug
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 测试环境日志，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// 写入运行日志文件头
///
/// # 参数
/// - `log_dir`: 日志目录
/// - `run_id`: 运行编号
///
/// # 返回
/// 返回日志文件路径
pub fn init_log_file(log_dir: &Path, run_id: &str) -> AppResult<String> {
    let path = log_dir.join(format!("run_{}.log", run_id));
    let path_str = path.display().to_string();
    fs::create_dir_all(log_dir).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;

    let log_header = format!(
        "{}\n采购单据生成日志 - {}\n运行编号: {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        run_id,
        "=".repeat(60)
    );
    fs::write(&path, log_header).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;
    Ok(path_str)
}

/// 记录程序启动信息
pub fn log_startup(batch: &BatchRun, run_id: &str, api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 采购单据批量生成");
    info!("🆔 运行编号: {}", run_id);
    info!(
        "📅 日期范围: {} ~ {}，目标采购订单 {} 张",
        batch.start_date, batch.end_date, batch.total_target_count
    );
    info!("🌐 单据服务: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录月份开始信息
pub fn log_month_start(month: YearMonth, index: usize, total: usize, target: u32) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个月: {}", index, total, month);
    info!("📄 本月目标采购订单: {} 张", target);
    info!("{}", "=".repeat(60));
}

/// 记录月份完成信息
pub fn log_month_complete(outcome: &MonthOutcome) {
    info!("\n{}", "─".repeat(60));
    match outcome.exhausted_at {
        None => info!("✓ [月份 {}] 四个阶段全部完成", outcome.month),
        Some(stage) => info!("✗ [月份 {}] 在 {} 阶段中断", outcome.month, stage),
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));

    for outcome in &summary.months {
        let cells: Vec<String> = StageType::CHAIN
            .iter()
            .map(|stage| match outcome.stage(*stage) {
                Some(r) => format!("{} {}/{}", stage.key_prefix(), r.succeeded, r.attempted),
                None => format!("{} -", stage.key_prefix()),
            })
            .collect();
        info!("[月份 {}] {}", outcome.month, cells.join(" | "));
    }

    info!("{}", "=".repeat(60));
    info!(
        "✅ 完整月份: {}/{}",
        summary.completed_months(),
        summary.months.len()
    );
    info!(
        "❌ 中断月份: {}",
        summary.months.len() - summary.completed_months()
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
