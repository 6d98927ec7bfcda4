//! 采购入库单策略

use rand::rngs::StdRng;
use serde_json::Value;

use crate::error::MasterDataError;
use crate::models::payload::{PurchaseReceiptItem, PurchaseReceiptPayload, TaxPayload};
use crate::models::{DocumentStatus, LineItem, StageDetails, StageDocument, StageType, TaxLine};
use crate::workflow::run_ctx::{MonthCtx, RunContext};
use crate::workflow::strategy::{committed_id, format_date, offset_date, StageStrategy};

/// 入库日 = 下单日 + 1~14 天
const RECEIPT_DELAY_MIN: i64 = 1;
const RECEIPT_DELAY_MAX: i64 = 14;

pub struct ReceiptStrategy<'a> {
    run: &'a RunContext,
}

impl<'a> ReceiptStrategy<'a> {
    pub fn new(run: &'a RunContext) -> Self {
        Self { run }
    }

    fn receipt_line(&self, order_line: &LineItem) -> Result<LineItem, MasterDataError> {
        let item = self
            .run
            .master_data
            .item(&order_line.item_code)
            .ok_or_else(|| MasterDataError::ItemMissing {
                item_code: order_line.item_code.clone(),
            })?;

        let batch_no = if item.has_batch_no {
            let batch = self
                .run
                .master_data
                .batch_for(&item.item_code)
                .ok_or_else(|| MasterDataError::BatchMissing {
                    item_code: item.item_code.clone(),
                })?;
            Some(batch.to_string())
        } else {
            None
        };

        let mut line = LineItem::new(
            &order_line.item_code,
            &order_line.item_name,
            &order_line.uom,
            order_line.qty,
            order_line.rate,
            &order_line.warehouse,
        );
        line.batch_no = batch_no;
        line.upstream_line = order_line.remote_id.clone();
        Ok(line)
    }
}

impl StageStrategy for ReceiptStrategy<'_> {
    fn stage(&self) -> StageType {
        StageType::Receipt
    }

    fn build(
        &self,
        upstream: Option<&StageDocument>,
        seq: usize,
        ctx: &MonthCtx,
        rng: &mut StdRng,
    ) -> Result<StageDocument, MasterDataError> {
        let order = upstream.ok_or_else(|| MasterDataError::UpstreamUncommitted {
            natural_key: self.natural_key(seq, ctx),
        })?;
        let order_id = committed_id(order)?;

        let line_items = order
            .line_items
            .iter()
            .map(|line| self.receipt_line(line))
            .collect::<Result<Vec<_>, _>>()?;

        let net: f64 = line_items.iter().map(|l| l.amount).sum();
        let tax_lines = order
            .tax_lines
            .iter()
            .map(|t| TaxLine::new(t.rate_percent, net, &t.account_head, &t.description))
            .collect();
        let received_qty = line_items.iter().map(|l| l.qty).sum();

        Ok(StageDocument {
            stage_type: StageType::Receipt,
            natural_key: self.natural_key(seq, ctx),
            party_reference: order.party_reference.clone(),
            posting_date: offset_date(
                order.posting_date,
                RECEIPT_DELAY_MIN,
                RECEIPT_DELAY_MAX,
                ctx.month_end,
                rng,
            ),
            line_items,
            tax_lines,
            upstream_reference: Some(order_id.clone()),
            origin_reference: Some(order_id),
            assigned_id: None,
            status: DocumentStatus::Pending,
            details: StageDetails::Receipt { received_qty },
        })
    }

    fn to_payload(&self, doc: &StageDocument) -> Result<Value, serde_json::Error> {
        let settings = &self.run.settings;
        let order_id = doc.upstream_reference.clone().unwrap_or_default();

        let payload = PurchaseReceiptPayload {
            doctype: StageType::Receipt.doctype(),
            naming_series: "MAT-PRE-.YYYY.-",
            company: settings.company.clone(),
            currency: settings.currency.clone(),
            conversion_rate: settings.conversion_rate,
            posting_date: format_date(doc.posting_date),
            supplier: doc.party_reference.clone(),
            items: doc
                .line_items
                .iter()
                .map(|line| PurchaseReceiptItem {
                    item_code: line.item_code.clone(),
                    item_name: line.item_name.clone(),
                    received_qty: line.qty,
                    qty: line.qty,
                    rate: line.rate,
                    amount: line.amount,
                    uom: line.uom.clone(),
                    stock_uom: line.uom.clone(),
                    conversion_factor: 1.0,
                    batch_no: line.batch_no.clone(),
                    purchase_order: order_id.clone(),
                    purchase_order_item: line.upstream_line.clone(),
                    warehouse: line.warehouse.clone(),
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
                    cost_center: None,
                })
                .collect(),
            docstatus: 1,
        };

        serde_json::to_value(payload)
    }
}
