//! 流水线控制器 - 编排层
//!
//! ## 职责
//!
//! 按月驱动四个阶段：采购订单 → 入库单 → 发票 → 付款单。
//!
//! - 某阶段没有任何成功单据时，本月后续阶段全部跳过
//! - 某月失败不影响后续月份
//! - 每处理完一个月写一次断点

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::clients::DocumentService;
use crate::error::{AppError, AppResult, PipelineError};
use crate::models::{BatchRun, MonthOutcome, RunSummary, StageReport, YearMonth};
use crate::services::{distribute, CheckpointStore, ResultLedger, RunManifest};
use crate::utils::logging;
use crate::workflow::{
    InvoiceStrategy, MonthCtx, OrderStrategy, PaymentStrategy, ReceiptStrategy, RunContext,
    StageGenerator, StageInput, StageOutput, StageStrategy,
};

pub struct PipelineController<'a> {
    service: &'a dyn DocumentService,
    ledger: &'a ResultLedger,
    run: &'a RunContext,
    rng: StdRng,
    manifest: Option<RunManifest>,
    checkpoint: Option<CheckpointStore>,
}

impl<'a> PipelineController<'a> {
    /// `seed` 为 `None` 时使用系统熵源
    pub fn new(
        service: &'a dyn DocumentService,
        ledger: &'a ResultLedger,
        run: &'a RunContext,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            service,
            ledger,
            run,
            rng,
            manifest: None,
            checkpoint: None,
        }
    }

    /// 启用断点：已完成的月份会被跳过，每月结束后保存清单
    pub fn with_checkpoint(mut self, store: CheckpointStore, manifest: RunManifest) -> Self {
        self.checkpoint = Some(store);
        self.manifest = Some(manifest);
        self
    }

    /// 执行整个批次
    ///
    /// 只有配置错误和台账错误会中止运行，其余错误只影响当月。
    pub async fn run(&mut self, batch: &BatchRun) -> AppResult<RunSummary> {
        let allocation = distribute(batch.total_target_count, batch.start_date, batch.end_date)?;
        let total_months = allocation.len();
        let mut summary = RunSummary {
            run_id: self.run.run_id.clone(),
            months: Vec::with_capacity(total_months),
        };

        for (index, (month, target)) in allocation.iter().enumerate() {
            if let Some(done) = self.completed_outcome(month) {
                info!("[月份 {}] ⏭️ 断点显示已完成，跳过", month);
                summary.months.push(done);
                continue;
            }

            let attempt = self
                .manifest
                .as_ref()
                .map_or(1, |m| m.next_attempt(month));
            logging::log_month_start(month, index + 1, total_months, target);
            if attempt > 1 {
                info!("[月份 {}] 🔁 第 {} 次处理", month, attempt);
            }

            let outcome = match self.process_attempt(month, target, attempt).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("[月份 {}] ❌ 处理过程中发生错误: {}", month, e);
                    MonthOutcome {
                        month,
                        target_count: target,
                        attempt,
                        stages: Vec::new(),
                        exhausted_at: Some(crate::models::StageType::Order),
                    }
                }
            };

            logging::log_month_complete(&outcome);
            self.save_checkpoint(&outcome)?;
            summary.months.push(outcome);
        }

        Ok(summary)
    }

    /// 处理单月：四个阶段依次执行，任一阶段无成功单据即短路
    pub async fn process_month(
        &mut self,
        year: i32,
        month: u32,
        target_count: u32,
    ) -> AppResult<MonthOutcome> {
        self.process_attempt(YearMonth::new(year, month), target_count, 1)
            .await
    }

    async fn process_attempt(
        &mut self,
        month: YearMonth,
        target_count: u32,
        attempt: u32,
    ) -> AppResult<MonthOutcome> {
        let ctx = MonthCtx::for_month(month)
            .ok_or_else(|| AppError::Other(format!("非法月份: {}", month)))?
            .with_attempt(attempt);
        let run = self.run;

        let mut outcome = MonthOutcome {
            month,
            target_count,
            attempt,
            stages: Vec::with_capacity(4),
            exhausted_at: None,
        };

        let orders = self
            .run_stage(OrderStrategy::new(run), ctx, StageInput::Count(target_count))
            .await?;
        if !advance(&mut outcome, orders.report) {
            return Ok(outcome);
        }

        let receipts = self
            .run_stage(
                ReceiptStrategy::new(run),
                ctx,
                StageInput::Upstream(orders.successes),
            )
            .await?;
        if !advance(&mut outcome, receipts.report) {
            return Ok(outcome);
        }

        let invoices = self
            .run_stage(
                InvoiceStrategy::new(run),
                ctx,
                StageInput::Upstream(receipts.successes),
            )
            .await?;
        if !advance(&mut outcome, invoices.report) {
            return Ok(outcome);
        }

        let payments = self
            .run_stage(
                PaymentStrategy::new(run),
                ctx,
                StageInput::Upstream(invoices.successes),
            )
            .await?;
        advance(&mut outcome, payments.report);

        Ok(outcome)
    }

    async fn run_stage<S: StageStrategy>(
        &mut self,
        strategy: S,
        ctx: MonthCtx,
        input: StageInput,
    ) -> AppResult<StageOutput> {
        // 每个生成器一个独立子随机源，保证同一种子下结果可复现
        let rng = StdRng::seed_from_u64(self.rng.random::<u64>());
        let mut generator = StageGenerator::new(strategy, self.service, self.ledger, self.run, rng);
        generator.configure(ctx, input);
        generator.run().await
    }

    fn completed_outcome(&self, month: YearMonth) -> Option<MonthOutcome> {
        let manifest = self.manifest.as_ref()?;
        if !manifest.is_completed(month) {
            return None;
        }
        manifest.months.iter().find(|m| m.month == month).cloned()
    }

    fn save_checkpoint(&mut self, outcome: &MonthOutcome) -> AppResult<()> {
        if let (Some(store), Some(manifest)) = (&self.checkpoint, &mut self.manifest) {
            manifest.record(outcome.clone());
            store.save(manifest)?;
        }
        Ok(())
    }
}

/// 记录阶段结果，返回是否继续下一阶段
fn advance(outcome: &mut MonthOutcome, report: StageReport) -> bool {
    let stage = report.stage;
    let exhausted = report.is_exhausted();
    outcome.stages.push(report);

    if exhausted {
        let signal = PipelineError::StageExhausted {
            stage,
            month: outcome.month.to_string(),
        };
        warn!("[月份 {}] ⚠️ {}，跳过后续阶段", outcome.month, signal);
        outcome.exhausted_at = Some(stage);
    }
    !exhausted
}
