use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing::error;

use procurement_submit::utils::logging;
use procurement_submit::{App, BatchRun, Config};

/// 按月批量生成采购订单、入库单、发票和付款单
#[derive(Parser, Debug)]
#[command(name = "procurement_submit", version)]
struct Args {
    /// 起始日期 (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// 结束日期 (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// 采购订单目标总数
    #[arg(long)]
    total: u32,

    /// TOML 配置文件
    #[arg(long, env = "PROCUREMENT_CONFIG")]
    config: Option<PathBuf>,

    /// 随机种子，相同种子生成相同单据
    #[arg(long)]
    seed: Option<u64>,

    /// 续跑指定运行编号
    #[arg(long, value_name = "RUN_ID")]
    resume: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 初始化日志
    logging::init();

    let args = Args::parse();

    // 加载配置
    let mut config = match &args.config {
        Some(path) => Config::from_toml_file(path)?.with_env_overrides()?,
        None => Config::from_env()?,
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let batch = BatchRun::new(args.start, args.end, args.total);

    // 初始化并运行应用
    let app = App::initialize(config, batch, args.resume).await?;
    let summary = match app.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("❌ 运行中止 ({}): {}", app.run_id(), e);
            return Err(e.into());
        }
    };

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            "❌ 有 {} 个月份未完整完成，可使用 --resume {} 续跑",
            summary.months.len() - summary.completed_months(),
            app.run_id()
        );
        Ok(ExitCode::FAILURE)
    }
}
