//! 批次运行参数与按月分配结果

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 一次顶层运行：日期范围 + 目标订单总数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRun {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_target_count: u32,
}

impl BatchRun {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, total_target_count: u32) -> Self {
        Self {
            start_date,
            end_date,
            total_target_count,
        }
    }
}

/// 日历月份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// 该月第一天
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// 该月最后一天
    pub fn last_day(&self) -> Option<NaiveDate> {
        let next = self.succ();
        NaiveDate::from_ymd_opt(next.year, next.month, 1).map(|d| d - Duration::days(1))
    }

    /// `(month_start, month_end)`，两端都包含
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_day()?, self.last_day()?))
    }

    /// 两个月份之间（含两端）的月数
    pub fn months_between(start: YearMonth, end: YearMonth) -> i64 {
        (end.year as i64 - start.year as i64) * 12 + end.month as i64 - start.month as i64 + 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 月份 → 当月订单数量
///
/// 由 [`crate::services::volume_distributor::distribute`] 构造，
/// 覆盖运行范围内的每个月份，按时间顺序迭代。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAllocation {
    counts: BTreeMap<YearMonth, u32>,
}

impl MonthlyAllocation {
    pub(crate) fn insert(&mut self, month: YearMonth, count: u32) {
        self.counts.insert(month, count);
    }

    pub fn get(&self, month: &YearMonth) -> Option<u32> {
        self.counts.get(month).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, u32)> + '_ {
        self.counts.iter().map(|(m, c)| (*m, *c))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| *c as u64).sum()
    }
}
