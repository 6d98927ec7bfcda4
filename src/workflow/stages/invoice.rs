//! 采购发票策略

use chrono::Duration;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::error::MasterDataError;
use crate::models::payload::{PurchaseInvoiceItem, PurchaseInvoicePayload, TaxPayload};
use crate::models::{DocumentStatus, LineItem, StageDetails, StageDocument, StageType, TaxLine};
use crate::workflow::run_ctx::{MonthCtx, RunContext};
use crate::workflow::strategy::{committed_id, format_date, offset_date, StageStrategy};

/// 开票日 = 入库日 + 0~3 天
const INVOICE_DELAY_MIN: i64 = 0;
const INVOICE_DELAY_MAX: i64 = 3;
/// 付款期限
pub const PAYMENT_TERM_DAYS: i64 = 30;

pub struct InvoiceStrategy<'a> {
    run: &'a RunContext,
}

impl<'a> InvoiceStrategy<'a> {
    pub fn new(run: &'a RunContext) -> Self {
        Self { run }
    }
}

impl StageStrategy for InvoiceStrategy<'_> {
    fn stage(&self) -> StageType {
        StageType::Invoice
    }

    fn build(
        &self,
        upstream: Option<&StageDocument>,
        seq: usize,
        ctx: &MonthCtx,
        rng: &mut StdRng,
    ) -> Result<StageDocument, MasterDataError> {
        let receipt = upstream.ok_or_else(|| MasterDataError::UpstreamUncommitted {
            natural_key: self.natural_key(seq, ctx),
        })?;
        let receipt_id = committed_id(receipt)?;

        let received_qty = |line: &LineItem| match &receipt.details {
            StageDetails::Receipt { received_qty } if receipt.line_items.len() == 1 => {
                *received_qty
            }
            _ => line.qty,
        };

        let line_items: Vec<LineItem> = receipt
            .line_items
            .iter()
            .map(|line| {
                let mut invoiced = LineItem::new(
                    &line.item_code,
                    &line.item_name,
                    &line.uom,
                    received_qty(line),
                    line.rate,
                    &line.warehouse,
                );
                invoiced.upstream_line = line.remote_id.clone();
                invoiced
            })
            .collect();

        let net: f64 = line_items.iter().map(|l| l.amount).sum();
        let tax_lines = receipt
            .tax_lines
            .iter()
            .map(|t| TaxLine::new(t.rate_percent, net, &t.account_head, &t.description))
            .collect();

        let posting_date = offset_date(
            receipt.posting_date,
            INVOICE_DELAY_MIN,
            INVOICE_DELAY_MAX,
            ctx.month_end,
            rng,
        );

        Ok(StageDocument {
            stage_type: StageType::Invoice,
            natural_key: self.natural_key(seq, ctx),
            party_reference: receipt.party_reference.clone(),
            posting_date,
            line_items,
            tax_lines,
            upstream_reference: Some(receipt_id.clone()),
            origin_reference: receipt.origin_reference.clone(),
            assigned_id: None,
            status: DocumentStatus::Pending,
            details: StageDetails::Invoice {
                due_date: posting_date + Duration::days(PAYMENT_TERM_DAYS),
                bill_no: format!("BILL-{}", receipt_id),
                credit_to: self.run.settings.credit_to_account.clone(),
            },
        })
    }

    fn to_payload(&self, doc: &StageDocument) -> Result<Value, serde_json::Error> {
        let settings = &self.run.settings;
        let (due_date, bill_no, credit_to) = match &doc.details {
            StageDetails::Invoice {
                due_date,
                bill_no,
                credit_to,
            } => (*due_date, bill_no.clone(), credit_to.clone()),
            _ => (
                doc.posting_date + Duration::days(PAYMENT_TERM_DAYS),
                String::new(),
                settings.credit_to_account.clone(),
            ),
        };
        let receipt_id = doc.upstream_reference.clone().unwrap_or_default();

        let payload = PurchaseInvoicePayload {
            doctype: StageType::Invoice.doctype(),
            naming_series: "ACC-PINV-.YYYY.-",
            company: settings.company.clone(),
            currency: settings.currency.clone(),
            conversion_rate: settings.conversion_rate,
            posting_date: format_date(doc.posting_date),
            due_date: format_date(due_date),
            bill_date: format_date(doc.posting_date),
            bill_no,
            supplier: doc.party_reference.clone(),
            credit_to,
            items: doc
                .line_items
                .iter()
                .map(|line| PurchaseInvoiceItem {
                    item_code: line.item_code.clone(),
                    item_name: line.item_name.clone(),
                    qty: line.qty,
                    rate: line.rate,
                    amount: line.amount,
                    uom: line.uom.clone(),
                    purchase_receipt: receipt_id.clone(),
                    pr_detail: line.upstream_line.clone(),
                    purchase_order: doc.origin_reference.clone(),
                    warehouse: line.warehouse.clone(),
                    expense_account: settings.expense_account.clone(),
                    cost_center: settings.cost_center.clone(),
                })
                .collect(),
            taxes: doc
                .tax_lines
                .iter()
                .map(|tax| TaxPayload {
                    charge_type: "On Net Total",
                    account_head: tax.account_head.clone(),
                    description: tax.description.clone(),
                    rate: tax.rate_percent,
                    tax_amount: tax.tax_amount,
                    cost_center: Some(settings.cost_center.clone()),
                })
                .collect(),
            docstatus: 1,
        };

        serde_json::to_value(payload)
    }
}
