//! 采购订单策略

use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::Value;

use crate::error::MasterDataError;
use crate::models::payload::{PurchaseOrderItem, PurchaseOrderPayload, TaxPayload};
use crate::models::{DocumentStatus, LineItem, StageDetails, StageDocument, StageType, TaxLine};
use crate::workflow::run_ctx::{MonthCtx, RunContext};
use crate::workflow::strategy::{format_date, StageStrategy};

/// 要求到货日 = 下单日 + 7 天
const SCHEDULE_LEAD_DAYS: i64 = 7;

pub struct OrderStrategy<'a> {
    run: &'a RunContext,
}

impl<'a> OrderStrategy<'a> {
    pub fn new(run: &'a RunContext) -> Self {
        Self { run }
    }
}

impl StageStrategy for OrderStrategy<'_> {
    fn stage(&self) -> StageType {
        StageType::Order
    }

    fn build(
        &self,
        _upstream: Option<&StageDocument>,
        seq: usize,
        ctx: &MonthCtx,
        rng: &mut StdRng,
    ) -> Result<StageDocument, MasterDataError> {
        let settings = &self.run.settings;
        let product = self
            .run
            .master_data
            .components()
            .choose(rng)
            .ok_or_else(|| MasterDataError::NoComponents {
                item_group: settings.component_item_group.clone(),
            })?;

        let supplier = self
            .run
            .master_data
            .supplier_for(&product.item_code)
            .ok_or_else(|| MasterDataError::SupplierMissing {
                item_code: product.item_code.clone(),
            })?;

        // 留出最后一天，保证入库日至少晚一天仍在本月内
        let latest = (ctx.month_end - Duration::days(1)).max(ctx.month_start);
        let span = (latest - ctx.month_start).num_days();
        let posting_date = ctx.month_start + Duration::days(rng.random_range(0..=span));

        let line = LineItem::new(
            &product.item_code,
            &product.item_name,
            &product.uom,
            settings.order_quantity,
            product.valuation_rate,
            &settings.warehouse,
        );
        let tax = TaxLine::new(
            settings.tax_rate_percent,
            line.amount,
            &settings.tax_account,
            &settings.tax_description,
        );

        Ok(StageDocument {
            stage_type: StageType::Order,
            natural_key: self.natural_key(seq, ctx),
            party_reference: supplier.to_string(),
            posting_date,
            line_items: vec![line],
            tax_lines: vec![tax],
            upstream_reference: None,
            origin_reference: None,
            assigned_id: None,
            status: DocumentStatus::Pending,
            details: StageDetails::Order {
                schedule_date: posting_date + Duration::days(SCHEDULE_LEAD_DAYS),
            },
        })
    }

    fn to_payload(&self, doc: &StageDocument) -> Result<Value, serde_json::Error> {
        let settings = &self.run.settings;
        let schedule_date = match &doc.details {
            StageDetails::Order { schedule_date } => *schedule_date,
            _ => doc.posting_date + Duration::days(SCHEDULE_LEAD_DAYS),
        };

        let payload = PurchaseOrderPayload {
            doctype: StageType::Order.doctype(),
            naming_series: "PUR-ORD-.YYYY.-",
            company: settings.company.clone(),
            currency: settings.currency.clone(),
            conversion_rate: settings.conversion_rate,
            transaction_date: format_date(doc.posting_date),
            schedule_date: format_date(schedule_date),
            supplier: doc.party_reference.clone(),
            items: doc
                .line_items
                .iter()
                .map(|line| PurchaseOrderItem {
                    item_code: line.item_code.clone(),
                    item_name: line.item_name.clone(),
                    qty: line.qty,
                    rate: line.rate,
                    amount: line.amount,
                    uom: line.uom.clone(),
                    stock_uom: line.uom.clone(),
                    conversion_factor: 1.0,
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
            total_taxes_and_charges: doc.tax_amount(),
            grand_total: doc.gross_amount(),
            docstatus: 1,
        };

        serde_json::to_value(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::stages::test_support::{month_ctx, run_context};
    use crate::config::CompanySettings;
    use crate::models::MasterData;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn order_amounts_follow_quantity_rate_and_tax() {
        let run = run_context();
        let strategy = OrderStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = month_ctx(2023, 1);

        let doc = strategy.build(None, 0, &ctx, &mut rng).unwrap();
        assert_eq!(doc.natural_key, "PO-202301-0001");
        assert_eq!(doc.party_reference, "SUP-0001");
        assert_eq!(doc.net_amount(), 5000.00);
        assert_eq!(doc.tax_amount(), 950.00);
        assert_eq!(doc.gross_amount(), 5950.00);
        assert!(doc.posting_date >= ctx.month_start);
        assert!(doc.posting_date < ctx.month_end);
    }

    #[test]
    fn payload_uses_transaction_and_schedule_dates() {
        let run = run_context();
        let strategy = OrderStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(9);
        let mut doc = strategy.build(None, 4, &month_ctx(2023, 2), &mut rng).unwrap();
        doc.posting_date = NaiveDate::from_ymd_opt(2023, 2, 10).unwrap();
        doc.details = StageDetails::Order {
            schedule_date: NaiveDate::from_ymd_opt(2023, 2, 17).unwrap(),
        };

        let payload = strategy.to_payload(&doc).unwrap();
        assert_eq!(payload["doctype"], "Purchase Order");
        assert_eq!(payload["transaction_date"], "2023-02-10");
        assert_eq!(payload["schedule_date"], "2023-02-17");
        assert_eq!(payload["items"][0]["qty"], 500.0);
        assert_eq!(payload["grand_total"], 5950.0);
    }

    #[test]
    fn missing_supplier_is_reported() {
        let run = crate::workflow::stages::test_support::run_context_without_supplier();
        let strategy = OrderStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(1);

        let err = strategy
            .build(None, 0, &month_ctx(2023, 1), &mut rng)
            .unwrap_err();
        assert!(matches!(err, MasterDataError::SupplierMissing { .. }));
    }

    #[test]
    fn empty_component_group_is_reported() {
        let master_data = MasterData::new(
            Vec::new(),
            "Fahrradkomponenten",
            HashMap::new(),
            HashMap::new(),
        );
        let run = RunContext::new("test-run", CompanySettings::default(), master_data, false);
        let strategy = OrderStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(1);

        let err = strategy
            .build(None, 0, &month_ctx(2023, 1), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            MasterDataError::NoComponents {
                item_group: "Fahrradkomponenten".into()
            }
        );
    }
}
