//! 结果台账 - 业务能力层
//!
//! 只负责"追加写入成功单据"能力，不关心流程

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, LedgerError};
use crate::models::{StageDetails, StageResult, StageType};

/// 台账中的一行：一张成功单据的一个行项目
#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    run_id: &'a str,
    stage: &'static str,
    assigned_id: &'a str,
    natural_key: &'a str,
    /// 同一月份第几次处理，区分续跑时重复的单据键
    attempt: u32,
    posting_date: String,
    party: &'a str,
    upstream_reference: &'a str,
    origin_reference: &'a str,
    line_remote_id: &'a str,
    item_code: &'a str,
    item_name: &'a str,
    qty: f64,
    rate: f64,
    amount: f64,
    batch_no: &'a str,
    tax_rate_percent: f64,
    tax_amount: f64,
    gross_amount: f64,
    due_date: String,
    reference_no: &'a str,
}

/// 结果台账
///
/// 职责：
/// - 每次运行每个阶段一个 CSV 文件，只追加
/// - 只写成功结果，失败结果只记录日志
/// - 不提供修改或删除
pub struct ResultLedger {
    root: PathBuf,
}

impl ResultLedger {
    /// `root` 下按运行编号建子目录
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    pub fn stage_file(&self, stage: StageType, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(format!("{}.csv", stage.name()))
    }

    /// 追加写入本批结果中的成功单据
    ///
    /// # 返回
    /// 返回写入的行数
    pub fn append(
        &self,
        stage: StageType,
        run_id: &str,
        results: &[StageResult],
    ) -> AppResult<usize> {
        self.append_attempt(stage, run_id, 1, results)
    }

    /// 同 `append`，并记录本月第几次处理
    pub fn append_attempt(
        &self,
        stage: StageType,
        run_id: &str,
        attempt: u32,
        results: &[StageResult],
    ) -> AppResult<usize> {
        for failed in results.iter().filter(|r| !r.success) {
            warn!(
                "[{}] ⚠️ {} 提交失败，不写入台账: {}",
                stage,
                failed.document.natural_key,
                failed.error.as_deref().unwrap_or("未知错误")
            );
        }

        let committed: Vec<&StageResult> = results.iter().filter(|r| r.success).collect();
        if committed.is_empty() {
            debug!("[{}] 没有成功单据需要写入台账", stage);
            return Ok(0);
        }

        let path = self.stage_file(stage, run_id);
        let path_str = path.display().to_string();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| AppError::ledger_write_failed(&path_str, e))?;
        }

        let is_new = !path.exists() || fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::ledger_write_failed(&path_str, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        let csv_failed = |source: csv::Error| LedgerError::Csv {
            path: path_str.clone(),
            source,
        };

        let mut rows = 0;
        for result in committed {
            for row in Self::rows(run_id, stage, attempt, result) {
                writer.serialize(row).map_err(csv_failed)?;
                rows += 1;
            }
        }
        writer
            .flush()
            .map_err(|e| AppError::ledger_write_failed(&path_str, e))?;

        debug!("[{}] 已写入 {} 行到 {}", stage, rows, path_str);
        Ok(rows)
    }

    fn rows<'a>(
        run_id: &'a str,
        stage: StageType,
        attempt: u32,
        result: &'a StageResult,
    ) -> impl Iterator<Item = LedgerRow<'a>> + 'a {
        let doc = &result.document;
        let tax_rate_percent = doc.tax_lines.first().map(|t| t.rate_percent).unwrap_or(0.0);
        let (due_date, reference_no) = match &doc.details {
            StageDetails::Invoice { due_date, .. } => (due_date.to_string(), ""),
            StageDetails::Payment { reference_no, .. } => (String::new(), reference_no.as_str()),
            _ => (String::new(), ""),
        };

        doc.line_items.iter().map(move |line| LedgerRow {
            run_id,
            stage: stage.name(),
            assigned_id: result.assigned_id.as_deref().unwrap_or_default(),
            natural_key: &doc.natural_key,
            attempt,
            posting_date: doc.posting_date.to_string(),
            party: &doc.party_reference,
            upstream_reference: doc.upstream_reference.as_deref().unwrap_or_default(),
            origin_reference: doc.origin_reference.as_deref().unwrap_or_default(),
            line_remote_id: line.remote_id.as_deref().unwrap_or_default(),
            item_code: &line.item_code,
            item_name: &line.item_name,
            qty: line.qty,
            rate: line.rate,
            amount: line.amount,
            batch_no: line.batch_no.as_deref().unwrap_or_default(),
            tax_rate_percent,
            tax_amount: doc.tax_amount(),
            gross_amount: doc.gross_amount(),
            due_date: due_date.clone(),
            reference_no,
        })
    }
}
