//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量运行和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批次处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 加载主数据、创建单据服务客户端
//! - 生成或沿用运行编号，读取断点
//!
//! ### `pipeline_controller` - 流水线控制器
//! - 把目标数量分摊到各月
//! - 按月依次执行四个阶段，无成功单据时短路
//! - 每月结束后写断点
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次运行)
//!     ↓
//! pipeline_controller (Vec<Month>)
//!     ↓
//! workflow::StageGenerator (某月某阶段)
//!     ↓
//! services / clients (分配、台账、断点 / 单据服务)
//! ```

pub mod batch_processor;
pub mod pipeline_controller;

pub use batch_processor::App;
pub use pipeline_controller::PipelineController;
