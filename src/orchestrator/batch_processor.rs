//! 批次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次批量运行的资源准备和收尾。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、加载主数据、创建单据服务客户端
//! 2. **运行编号**：新运行生成编号，续跑沿用已有编号
//! 3. **断点续跑**：读取运行清单，跳过已完成的月份
//! 4. **全局统计**：按月、按阶段输出尝试数与成功数
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 `ErpClient` 与 `RunContext` 的模块
//! - **向下委托**：月份与阶段的调度交给 `PipelineController`

use tracing::info;
use uuid::Uuid;

use crate::clients::ErpClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_master_data, BatchRun, RunSummary};
use crate::orchestrator::pipeline_controller::PipelineController;
use crate::services::{CheckpointStore, ResultLedger, RunManifest};
use crate::utils::logging;
use crate::workflow::RunContext;

/// 应用主结构
pub struct App {
    config: Config,
    batch: BatchRun,
    run: RunContext,
    client: ErpClient,
    ledger: ResultLedger,
    log_file: String,
    resume: bool,
}

impl App {
    /// 初始化应用
    ///
    /// `resume` 为已有运行编号时续跑该运行
    pub async fn initialize(
        config: Config,
        batch: BatchRun,
        resume: Option<String>,
    ) -> AppResult<Self> {
        let is_resume = resume.is_some();
        let run_id = resume.unwrap_or_else(new_run_id);

        let log_file = logging::init_log_file(&config.log_dir, &run_id)?;
        logging::log_startup(&batch, &run_id, &config.api_base_url);

        info!("📁 正在加载主数据: {}", config.master_data_dir.display());
        let master_data =
            load_master_data(&config.master_data_dir, &config.company.component_item_group)?;
        info!("✓ 可采购物料 {} 种", master_data.components().len());

        let client = ErpClient::new(&config)?;
        let ledger = ResultLedger::new(&config.output_dir);
        let run = RunContext::new(
            run_id,
            config.company.clone(),
            master_data,
            config.verbose_logging,
        );

        Ok(Self {
            config,
            batch,
            run,
            client,
            ledger,
            log_file,
            resume: is_resume,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run.run_id
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunSummary> {
        let store = CheckpointStore::new(&self.ledger.run_dir(&self.run.run_id));
        let manifest = if self.resume {
            match store.load_for(&self.batch)? {
                Some(manifest) => {
                    info!("🔁 从断点续跑: {}", store.path().display());
                    manifest
                }
                None => self.new_manifest(),
            }
        } else {
            self.new_manifest()
        };

        let seed = manifest.seed;
        let mut controller = PipelineController::new(&self.client, &self.ledger, &self.run, seed)
            .with_checkpoint(store, manifest);
        let summary = controller.run(&self.batch).await?;

        logging::print_final_stats(&summary, &self.log_file);
        info!(
            "📂 台账目录: {}",
            self.ledger.run_dir(&self.run.run_id).display()
        );

        Ok(summary)
    }

    fn new_manifest(&self) -> RunManifest {
        RunManifest::new(self.run.run_id.clone(), self.batch, self.config.seed)
    }
}

/// 时间戳加随机后缀，如 `20230115-093000-1a2b3c4d`
fn new_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        &suffix[..8]
    )
}
