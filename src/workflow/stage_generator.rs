//! 阶段生成器 - 流程层
//!
//! 一个生成器处理"某月的某个阶段"：
//! 1. 根据输入构造候选单据（主数据缺失的跳过）
//! 2. 逐张提交到单据服务，单张失败不影响其余
//! 3. 成功结果追加写入台账
//!
//! 四种单据共用这一套流程，差异由 `StageStrategy` 提供。

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::clients::{CreateRequest, DocumentService};
use crate::error::{AppError, AppResult};
use crate::models::{StageDocument, StageReport, StageResult, StageType};
use crate::services::ResultLedger;
use crate::workflow::run_ctx::{MonthCtx, RunContext};
use crate::workflow::strategy::{StageInput, StageStrategy};

/// 一次阶段执行的产出
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub report: StageReport,
    /// 已提交的单据，作为下一阶段的输入
    pub successes: Vec<StageDocument>,
}

pub struct StageGenerator<'a, S: StageStrategy> {
    strategy: S,
    service: &'a dyn DocumentService,
    ledger: &'a ResultLedger,
    run: &'a RunContext,
    rng: StdRng,
    month: Option<MonthCtx>,
    input: StageInput,
}

impl<'a, S: StageStrategy> StageGenerator<'a, S> {
    pub fn new(
        strategy: S,
        service: &'a dyn DocumentService,
        ledger: &'a ResultLedger,
        run: &'a RunContext,
        rng: StdRng,
    ) -> Self {
        Self {
            strategy,
            service,
            ledger,
            run,
            rng,
            month: None,
            input: StageInput::Count(0),
        }
    }

    pub fn stage(&self) -> StageType {
        self.strategy.stage()
    }

    /// 设置处理月份与输入
    pub fn configure(&mut self, ctx: MonthCtx, input: StageInput) {
        self.month = Some(ctx);
        self.input = input;
    }

    fn month_ctx(&self) -> AppResult<MonthCtx> {
        self.month
            .ok_or_else(|| AppError::Other(format!("{} 生成器未配置月份", self.stage())))
    }

    /// 构造候选单据
    ///
    /// # 返回
    /// `(候选单据, 因主数据缺失跳过的数量)`
    pub fn generate(&mut self) -> AppResult<(Vec<StageDocument>, usize)> {
        let ctx = self.month_ctx()?;
        let input = std::mem::replace(&mut self.input, StageInput::Count(0));
        let mut candidates = Vec::with_capacity(input.len());
        let mut skipped = 0;

        let built = match &input {
            StageInput::Count(n) => (0..*n as usize)
                .map(|seq| self.strategy.build(None, seq, &ctx, &mut self.rng))
                .collect::<Vec<_>>(),
            StageInput::Upstream(docs) => docs
                .iter()
                .enumerate()
                .map(|(seq, up)| self.strategy.build(Some(up), seq, &ctx, &mut self.rng))
                .collect(),
        };

        for result in built {
            match result {
                Ok(doc) => candidates.push(doc),
                Err(e) => {
                    warn!("{} [{}] ⚠️ 跳过候选单据: {}", ctx, self.stage(), e);
                    skipped += 1;
                }
            }
        }

        self.input = input;
        debug!(
            "{} [{}] 构造候选单据 {} 张，跳过 {} 张",
            ctx,
            self.stage(),
            candidates.len(),
            skipped
        );
        Ok((candidates, skipped))
    }

    /// 提交一张单据
    ///
    /// 不返回错误：映射失败和服务失败都记为该单据失败。
    pub async fn submit(&self, mut doc: StageDocument) -> StageResult {
        let body = match self.strategy.to_payload(&doc) {
            Ok(body) => body,
            Err(e) => {
                doc.fail();
                return StageResult::failed(doc, format!("请求体映射失败: {}", e));
            }
        };

        if self.run.verbose_logging {
            debug!("📤 {} 请求体: {}", doc.natural_key, body);
        }

        let request = CreateRequest {
            stage: self.stage(),
            natural_key: doc.natural_key.clone(),
            body,
        };

        match self.service.create(&request).await {
            Ok(created) => {
                doc.commit(created.assigned_id, &created.line_ids);
                StageResult::committed(doc)
            }
            Err(e) => {
                doc.fail();
                StageResult::failed(doc, e.to_string())
            }
        }
    }

    /// 成功结果写入台账
    pub fn persist(&self, results: &[StageResult]) -> AppResult<usize> {
        let attempt = self.month.map(|m| m.attempt).unwrap_or(1);
        self.ledger
            .append_attempt(self.stage(), &self.run.run_id, attempt, results)
    }

    /// 执行本阶段：构造、逐张提交、写台账
    pub async fn run(&mut self) -> AppResult<StageOutput> {
        let ctx = self.month_ctx()?;
        let stage = self.stage();
        let (candidates, skipped) = self.generate()?;
        let attempted = candidates.len();

        info!("{} [{}] 📤 开始提交 {} 张单据", ctx, stage, attempted);

        let mut results = Vec::with_capacity(attempted);
        for (index, doc) in candidates.into_iter().enumerate() {
            let result = self.submit(doc).await;
            if result.success {
                debug!(
                    "{} [{}] ✓ ({}/{}) {} -> {}",
                    ctx,
                    stage,
                    index + 1,
                    attempted,
                    result.document.natural_key,
                    result.assigned_id.as_deref().unwrap_or("-")
                );
            }
            results.push(result);
        }

        self.persist(&results)?;

        let successes: Vec<StageDocument> = results
            .into_iter()
            .filter(|r| r.success)
            .map(|r| r.document)
            .collect();

        let report = StageReport {
            stage,
            attempted,
            succeeded: successes.len(),
            skipped,
        };

        if report.is_exhausted() {
            warn!("{} [{}] ❌ 没有成功单据", ctx, stage);
        } else {
            info!(
                "{} [{}] ✓ 成功 {}/{}，跳过 {}",
                ctx, stage, report.succeeded, attempted, skipped
            );
        }

        Ok(StageOutput { report, successes })
    }
}
