//! 阶段单据、行项目、税行与提交结果

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::StageType;

/// 四舍五入到两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 单据状态，`Committed` 与 `Failed` 都是终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Pending,
    Committed,
    Failed,
}

/// 行项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_code: String,
    pub item_name: String,
    pub uom: String,
    pub qty: f64,
    pub rate: f64,
    /// 始终等于 `round2(qty * rate)`
    pub amount: f64,
    pub warehouse: String,
    pub batch_no: Option<String>,
    /// 上游单据对应行的远程编号
    pub upstream_line: Option<String>,
    /// 提交成功后远程系统分配的行编号
    pub remote_id: Option<String>,
}

impl LineItem {
    pub fn new(
        item_code: impl Into<String>,
        item_name: impl Into<String>,
        uom: impl Into<String>,
        qty: f64,
        rate: f64,
        warehouse: impl Into<String>,
    ) -> Self {
        Self {
            item_code: item_code.into(),
            item_name: item_name.into(),
            uom: uom.into(),
            qty,
            rate,
            amount: round2(qty * rate),
            warehouse: warehouse.into(),
            batch_no: None,
            upstream_line: None,
            remote_id: None,
        }
    }
}

/// 税行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub rate_percent: f64,
    pub base_amount: f64,
    /// 始终等于 `round2(base_amount * rate_percent / 100)`
    pub tax_amount: f64,
    pub account_head: String,
    pub description: String,
}

impl TaxLine {
    pub fn new(
        rate_percent: f64,
        base_amount: f64,
        account_head: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            rate_percent,
            base_amount,
            tax_amount: round2(base_amount * rate_percent / 100.0),
            account_head: account_head.into(),
            description: description.into(),
        }
    }
}

/// 各阶段特有字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageDetails {
    Order {
        schedule_date: NaiveDate,
    },
    Receipt {
        received_qty: f64,
    },
    Invoice {
        due_date: NaiveDate,
        bill_no: String,
        credit_to: String,
    },
    Payment {
        paid_amount: f64,
        reference_no: String,
        reference_date: NaiveDate,
        paid_from: String,
        paid_to: String,
    },
}

/// 采购链中的一张单据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDocument {
    pub stage_type: StageType,
    /// 本地生成的单据键，提交前用于日志与追溯
    pub natural_key: String,
    /// 供应商编号
    pub party_reference: String,
    pub posting_date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub tax_lines: Vec<TaxLine>,
    /// 直接上游单据的远程编号
    pub upstream_reference: Option<String>,
    /// 源头采购订单的远程编号
    pub origin_reference: Option<String>,
    pub assigned_id: Option<String>,
    pub status: DocumentStatus,
    pub details: StageDetails,
}

impl StageDocument {
    pub fn net_amount(&self) -> f64 {
        round2(self.line_items.iter().map(|l| l.amount).sum())
    }

    pub fn tax_amount(&self) -> f64 {
        round2(self.tax_lines.iter().map(|t| t.tax_amount).sum())
    }

    pub fn gross_amount(&self) -> f64 {
        round2(self.net_amount() + self.tax_amount())
    }

    /// 标记提交成功，记录远程编号与行编号
    pub fn commit(&mut self, assigned_id: String, line_ids: &[String]) {
        self.assigned_id = Some(assigned_id);
        for (line, id) in self.line_items.iter_mut().zip(line_ids) {
            line.remote_id = Some(id.clone());
        }
        self.status = DocumentStatus::Committed;
    }

    pub fn fail(&mut self) {
        self.status = DocumentStatus::Failed;
    }
}

/// 一次提交尝试的结果
#[derive(Debug, Clone)]
pub struct StageResult {
    pub document: StageDocument,
    pub success: bool,
    pub assigned_id: Option<String>,
    pub error: Option<String>,
}

impl StageResult {
    pub fn committed(document: StageDocument) -> Self {
        let assigned_id = document.assigned_id.clone();
        Self {
            document,
            success: true,
            assigned_id,
            error: None,
        }
    }

    pub fn failed(document: StageDocument, error: impl Into<String>) -> Self {
        Self {
            document,
            success: false,
            assigned_id: None,
            error: Some(error.into()),
        }
    }
}
