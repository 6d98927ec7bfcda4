//! 运行上下文
//!
//! `RunContext` 在启动时构造一次，以引用传给每个组件；
//! `MonthCtx` 封装"我正在处理哪个月"这一信息

use std::fmt::Display;

use chrono::NaiveDate;

use crate::config::CompanySettings;
use crate::models::{MasterData, YearMonth};

/// 整次运行共享的只读上下文
#[derive(Debug, Clone)]
pub struct RunContext {
    /// 运行编号，同时是台账子目录名
    pub run_id: String,
    pub settings: CompanySettings,
    pub master_data: MasterData,
    /// 是否输出请求体等详细日志
    pub verbose_logging: bool,
}

impl RunContext {
    pub fn new(
        run_id: impl Into<String>,
        settings: CompanySettings,
        master_data: MasterData,
        verbose_logging: bool,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            settings,
            master_data,
            verbose_logging,
        }
    }
}

/// 月份处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCtx {
    pub month: YearMonth,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    /// 第几次处理该月
    pub attempt: u32,
}

impl MonthCtx {
    pub fn new(month: YearMonth, month_start: NaiveDate, month_end: NaiveDate) -> Self {
        Self {
            month,
            month_start,
            month_end,
            attempt: 1,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// 用月份推出起止日期
    pub fn for_month(month: YearMonth) -> Option<Self> {
        let (start, end) = month.date_range()?;
        Some(Self::new(month, start, end))
    }

    /// 用于单据键的 `YYYYMM`
    pub fn key_segment(&self) -> String {
        format!("{:04}{:02}", self.month.year, self.month.month)
    }
}

impl Display for MonthCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[月份 {}]", self.month)
    }
}
