use std::fmt;

use serde::{Deserialize, Serialize};

/// 采购链中的单据类型，按依赖顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageType {
    Order,
    Receipt,
    Invoice,
    Payment,
}

impl StageType {
    /// 依赖顺序
    pub const CHAIN: [StageType; 4] = [
        StageType::Order,
        StageType::Receipt,
        StageType::Invoice,
        StageType::Payment,
    ];

    /// 远程系统中的单据类型名
    pub fn doctype(&self) -> &'static str {
        match self {
            StageType::Order => "Purchase Order",
            StageType::Receipt => "Purchase Receipt",
            StageType::Invoice => "Purchase Invoice",
            StageType::Payment => "Payment Entry",
        }
    }

    /// 台账文件名前缀与日志标识
    pub fn name(&self) -> &'static str {
        match self {
            StageType::Order => "purchase_orders",
            StageType::Receipt => "purchase_receipts",
            StageType::Invoice => "purchase_invoices",
            StageType::Payment => "payment_entries",
        }
    }

    /// 本地单据键前缀
    pub fn key_prefix(&self) -> &'static str {
        match self {
            StageType::Order => "PO",
            StageType::Receipt => "PR",
            StageType::Invoice => "PI",
            StageType::Payment => "PE",
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.doctype())
    }
}
