//! 阶段与月份的处理统计

use serde::{Deserialize, Serialize};

use crate::models::{StageType, YearMonth};

/// 单个阶段在某月的统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: StageType,
    /// 构造出的候选单据数（跳过的不计）
    pub attempted: usize,
    pub succeeded: usize,
    /// 因主数据缺失被跳过的候选数
    pub skipped: usize,
}

impl StageReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn is_exhausted(&self) -> bool {
        self.succeeded == 0
    }
}

/// 某月的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOutcome {
    pub month: YearMonth,
    pub target_count: u32,
    /// 第几次处理该月，续跑时递增
    #[serde(default = "first_attempt")]
    pub attempt: u32,
    /// 按执行顺序，短路后的阶段不出现
    pub stages: Vec<StageReport>,
    /// 没有成功单据的阶段
    pub exhausted_at: Option<StageType>,
}

fn first_attempt() -> u32 {
    1
}

impl MonthOutcome {
    /// 四个阶段都至少有一张成功单据
    pub fn is_complete(&self) -> bool {
        self.exhausted_at.is_none() && self.stages.len() == StageType::CHAIN.len()
    }

    pub fn stage(&self, stage: StageType) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

/// 整次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub months: Vec<MonthOutcome>,
}

impl RunSummary {
    pub fn completed_months(&self) -> usize {
        self.months.iter().filter(|m| m.is_complete()).count()
    }

    /// 所有月份都完整完成才算成功
    pub fn is_success(&self) -> bool {
        !self.months.is_empty() && self.completed_months() == self.months.len()
    }
}
