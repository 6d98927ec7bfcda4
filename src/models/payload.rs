//! 远程单据服务的请求体
//!
//! 每种单据一个强类型结构，由对应阶段策略的映射函数从 `StageDocument` 构造。

use serde::Serialize;

/// 采购订单
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderPayload {
    pub doctype: &'static str,
    pub naming_series: &'static str,
    pub company: String,
    pub currency: String,
    pub conversion_rate: f64,
    pub transaction_date: String,
    pub schedule_date: String,
    pub supplier: String,
    pub items: Vec<PurchaseOrderItem>,
    pub taxes: Vec<TaxPayload>,
    pub total_taxes_and_charges: f64,
    pub grand_total: f64,
    pub docstatus: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderItem {
    pub item_code: String,
    pub item_name: String,
    pub qty: f64,
    pub rate: f64,
    pub amount: f64,
    pub uom: String,
    pub stock_uom: String,
    pub conversion_factor: f64,
    pub warehouse: String,
}

/// 采购入库单
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceiptPayload {
    pub doctype: &'static str,
    pub naming_series: &'static str,
    pub company: String,
    pub currency: String,
    pub conversion_rate: f64,
    pub posting_date: String,
    pub supplier: String,
    pub items: Vec<PurchaseReceiptItem>,
    pub taxes: Vec<TaxPayload>,
    pub docstatus: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceiptItem {
    pub item_code: String,
    pub item_name: String,
    pub received_qty: f64,
    pub qty: f64,
    pub rate: f64,
    pub amount: f64,
    pub uom: String,
    pub stock_uom: String,
    pub conversion_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_no: Option<String>,
    pub purchase_order: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order_item: Option<String>,
    pub warehouse: String,
}

/// 采购发票
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseInvoicePayload {
    pub doctype: &'static str,
    pub naming_series: &'static str,
    pub company: String,
    pub currency: String,
    pub conversion_rate: f64,
    pub posting_date: String,
    pub due_date: String,
    pub bill_date: String,
    pub bill_no: String,
    pub supplier: String,
    pub credit_to: String,
    pub items: Vec<PurchaseInvoiceItem>,
    pub taxes: Vec<TaxPayload>,
    pub docstatus: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseInvoiceItem {
    pub item_code: String,
    pub item_name: String,
    pub qty: f64,
    pub rate: f64,
    pub amount: f64,
    pub uom: String,
    pub purchase_receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<String>,
    pub warehouse: String,
    pub expense_account: String,
    pub cost_center: String,
}

/// 付款单
#[derive(Debug, Clone, Serialize)]
pub struct PaymentEntryPayload {
    pub doctype: &'static str,
    pub naming_series: &'static str,
    pub payment_type: &'static str,
    pub posting_date: String,
    pub company: String,
    pub party_type: &'static str,
    pub party: String,
    pub paid_from: String,
    pub paid_to: String,
    pub paid_amount: f64,
    pub received_amount: f64,
    pub source_exchange_rate: f64,
    pub target_exchange_rate: f64,
    pub paid_from_account_currency: String,
    pub paid_to_account_currency: String,
    pub reference_no: String,
    pub reference_date: String,
    pub references: Vec<PaymentReference>,
    pub taxes: Vec<TaxPayload>,
    pub docstatus: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReference {
    pub reference_doctype: &'static str,
    pub reference_name: String,
    pub total_amount: f64,
    pub allocated_amount: f64,
}

/// 税行（各单据共用）
#[derive(Debug, Clone, Serialize)]
pub struct TaxPayload {
    pub charge_type: &'static str,
    pub account_head: String,
    pub description: String,
    pub rate: f64,
    pub tax_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
}
