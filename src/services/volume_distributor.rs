//! 订单量分配服务 - 业务能力层
//!
//! 只负责把目标订单总数分摊到日期范围内的各个月份

use chrono::NaiveDate;

use crate::error::{AppResult, ConfigError};
use crate::models::{MonthlyAllocation, YearMonth};

/// 把 `total` 分摊到 `[start, end]` 覆盖的每个日历月
///
/// 首尾不完整的月份也算一个月。每月先分得 `total / months`，
/// 余数按时间顺序补给最早的几个月，因此任意两个月相差不超过 1。
pub fn distribute(total: u32, start: NaiveDate, end: NaiveDate) -> AppResult<MonthlyAllocation> {
    if total < 1 || start > end {
        return Err(ConfigError::InvalidRange { start, end, total }.into());
    }

    let first = YearMonth::of(start);
    let last = YearMonth::of(end);
    let months = YearMonth::months_between(first, last) as u32;

    let base = total / months;
    let mut remainder = total % months;

    let mut allocation = MonthlyAllocation::default();
    let mut current = first;
    while current <= last {
        let mut count = base;
        if remainder > 0 {
            count += 1;
            remainder -= 1;
        }
        allocation.insert(current, count);
        current = current.succ();
    }

    Ok(allocation)
}
