//! 四种单据的阶段策略

pub mod invoice;
pub mod order;
pub mod payment;
pub mod receipt;

pub use invoice::InvoiceStrategy;
pub use order::OrderStrategy;
pub use payment::PaymentStrategy;
pub use receipt::ReceiptStrategy;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use chrono::{Duration, NaiveDate};

    use crate::config::CompanySettings;
    use crate::models::{
        CatalogItem, DocumentStatus, LineItem, MasterData, StageDetails, StageDocument, StageType,
        TaxLine, YearMonth,
    };
    use crate::workflow::run_ctx::{MonthCtx, RunContext};

    fn catalog_item(code: &str, group: &str, rate: f64, has_batch_no: bool) -> CatalogItem {
        CatalogItem {
            item_code: code.into(),
            item_name: format!("Teil {}", code),
            item_group: group.into(),
            valuation_rate: rate,
            uom: "Stk".into(),
            has_batch_no,
            description: String::new(),
        }
    }

    fn master_data(with_supplier: bool) -> MasterData {
        let suppliers = if with_supplier {
            HashMap::from([("BK-100".to_string(), "SUP-0001".to_string())])
        } else {
            HashMap::new()
        };
        MasterData::new(
            vec![
                catalog_item("BK-100", "Fahrradkomponenten", 10.0, false),
                catalog_item("BK-200", "Verbrauchsmaterial", 4.0, true),
                catalog_item("BK-300", "Verbrauchsmaterial", 4.0, true),
            ],
            "Fahrradkomponenten",
            suppliers,
            HashMap::from([("BK-200".to_string(), "B-2023-01".to_string())]),
        )
    }

    pub(crate) fn run_context() -> RunContext {
        RunContext::new("test-run", CompanySettings::default(), master_data(true), false)
    }

    pub(crate) fn run_context_without_supplier() -> RunContext {
        RunContext::new("test-run", CompanySettings::default(), master_data(false), false)
    }

    /// 组件组中有一个物料没有供应商映射
    pub(crate) fn run_context_with_unmapped_component() -> RunContext {
        let master_data = MasterData::new(
            vec![
                catalog_item("BK-100", "Fahrradkomponenten", 10.0, false),
                catalog_item("BK-150", "Fahrradkomponenten", 8.0, false),
            ],
            "Fahrradkomponenten",
            HashMap::from([("BK-100".to_string(), "SUP-0001".to_string())]),
            HashMap::new(),
        );
        RunContext::new("test-run", CompanySettings::default(), master_data, false)
    }

    pub(crate) fn month_ctx(year: i32, month: u32) -> MonthCtx {
        MonthCtx::for_month(YearMonth::new(year, month)).unwrap()
    }

    fn committed(
        stage_type: StageType,
        assigned_id: &str,
        posting_date: NaiveDate,
        line: LineItem,
        details: StageDetails,
    ) -> StageDocument {
        let settings = CompanySettings::default();
        let tax = TaxLine::new(
            settings.tax_rate_percent,
            line.amount,
            &settings.tax_account,
            &settings.tax_description,
        );
        StageDocument {
            stage_type,
            natural_key: format!("{}-202301-0001", stage_type.key_prefix()),
            party_reference: "SUP-0001".into(),
            posting_date,
            line_items: vec![line],
            tax_lines: vec![tax],
            upstream_reference: None,
            origin_reference: Some("PUR-ORD-0001".into()),
            assigned_id: Some(assigned_id.into()),
            status: DocumentStatus::Committed,
            details,
        }
    }

    pub(crate) fn committed_order(item_code: &str, posting_date: NaiveDate) -> StageDocument {
        let mut line = LineItem::new(item_code, "Teil", "Stk", 500.0, 10.0, "Lager Stuttgart - B");
        line.remote_id = Some("po-row-1".into());
        let mut doc = committed(
            StageType::Order,
            "PUR-ORD-0001",
            posting_date,
            line,
            StageDetails::Order {
                schedule_date: posting_date + Duration::days(7),
            },
        );
        doc.origin_reference = None;
        doc
    }

    pub(crate) fn committed_receipt(posting_date: NaiveDate, qty: f64, rate: f64) -> StageDocument {
        let mut line = LineItem::new("BK-100", "Teil", "Stk", qty, rate, "Lager Stuttgart - B");
        line.remote_id = Some("pr-row-1".into());
        let mut doc = committed(
            StageType::Receipt,
            "MAT-PRE-0001",
            posting_date,
            line,
            StageDetails::Receipt { received_qty: qty },
        );
        doc.upstream_reference = Some("PUR-ORD-0001".into());
        doc
    }

    pub(crate) fn committed_invoice(posting_date: NaiveDate) -> StageDocument {
        let mut line = LineItem::new("BK-100", "Teil", "Stk", 500.0, 10.0, "Lager Stuttgart - B");
        line.remote_id = Some("pi-row-1".into());
        let mut doc = committed(
            StageType::Invoice,
            "ACC-PINV-0001",
            posting_date,
            line,
            StageDetails::Invoice {
                due_date: posting_date + Duration::days(30),
                bill_no: "BILL-MAT-PRE-0001".into(),
                credit_to: CompanySettings::default().credit_to_account,
            },
        );
        doc.upstream_reference = Some("MAT-PRE-0001".into());
        doc
    }
}
