//! 阶段策略
//!
//! 四种单据共用一个生成器，差异全部收在策略里：
//! 日期偏移、金额推导、远程字段映射

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;

use crate::error::MasterDataError;
use crate::models::{StageDocument, StageType};
use crate::workflow::run_ctx::MonthCtx;

/// 生成器的输入
#[derive(Debug, Clone)]
pub enum StageInput {
    /// 采购订单：目标数量
    Count(u32),
    /// 下游阶段：上游成功单据
    Upstream(Vec<StageDocument>),
}

impl StageInput {
    pub fn len(&self) -> usize {
        match self {
            StageInput::Count(n) => *n as usize,
            StageInput::Upstream(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 单据类型策略
pub trait StageStrategy {
    fn stage(&self) -> StageType;

    /// 构造一张候选单据
    ///
    /// `upstream` 对采购订单为 `None`；主数据缺失时返回错误，调用方跳过该候选。
    fn build(
        &self,
        upstream: Option<&StageDocument>,
        seq: usize,
        ctx: &MonthCtx,
        rng: &mut StdRng,
    ) -> Result<StageDocument, MasterDataError>;

    /// 映射为远程请求体
    fn to_payload(&self, doc: &StageDocument) -> Result<Value, serde_json::Error>;

    /// 本地单据键
    fn natural_key(&self, seq: usize, ctx: &MonthCtx) -> String {
        format!(
            "{}-{}-{:04}",
            self.stage().key_prefix(),
            ctx.key_segment(),
            seq + 1
        )
    }
}

/// `base + U(min_days, max_days)`，不晚于 `clamp_to`
pub fn offset_date(
    base: NaiveDate,
    min_days: i64,
    max_days: i64,
    clamp_to: NaiveDate,
    rng: &mut StdRng,
) -> NaiveDate {
    let days = if max_days > min_days {
        rng.random_range(min_days..=max_days)
    } else {
        min_days
    };
    (base + Duration::days(days)).min(clamp_to)
}

/// 上游单据必须已提交
pub fn committed_id(upstream: &StageDocument) -> Result<String, MasterDataError> {
    upstream
        .assigned_id
        .clone()
        .ok_or_else(|| MasterDataError::UpstreamUncommitted {
            natural_key: upstream.natural_key.clone(),
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
