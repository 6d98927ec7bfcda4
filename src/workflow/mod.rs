//! 流程层
//!
//! 定义"某月某阶段"的完整处理流程：构造候选 → 逐张提交 → 写台账

pub mod run_ctx;
pub mod stage_generator;
pub mod stages;
pub mod strategy;

pub use run_ctx::{MonthCtx, RunContext};
pub use stage_generator::{StageGenerator, StageOutput};
pub use stages::{InvoiceStrategy, OrderStrategy, PaymentStrategy, ReceiptStrategy};
pub use strategy::{StageInput, StageStrategy};
