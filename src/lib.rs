//! # Procurement Submit
//!
//! 按月批量生成采购链单据并提交到 ERP 的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 单据服务契约与 HTTP 实现
//! - `DocumentService` - 只暴露"创建单据"能力
//! - `ErpClient` - `POST {base}/resource/{Doctype}`，失败时转储请求体
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `distribute` - 把目标数量分摊到各月
//! - `ResultLedger` - 成功单据追加写入 CSV 台账
//! - `CheckpointStore` - 运行清单，支持续跑
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"某月某阶段"的处理流程
//! - `StageGenerator` - 构造 → 逐张提交 → 写台账
//! - `StageStrategy` - 订单 / 入库 / 发票 / 付款四种策略
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用生命周期与全局统计
//! - `orchestrator/pipeline_controller` - 按月驱动四个阶段，短路与断点
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{DocumentService, ErpClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchRun, RunSummary, StageType};
pub use orchestrator::{App, PipelineController};
pub use workflow::RunContext;
