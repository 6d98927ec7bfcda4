//! 单据服务契约
//!
//! 只暴露"创建单据"能力，每种单据类型一个远程端点。

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ServiceError;
use crate::models::StageType;

/// 一次创建请求
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub stage: StageType,
    /// 本地单据键（仅用于日志与失败转储）
    pub natural_key: String,
    pub body: Value,
}

/// 远程系统返回的已创建单据
#[derive(Debug, Clone)]
pub struct CreatedDocument {
    /// 全局唯一且稳定的单据编号
    pub assigned_id: String,
    /// 按行顺序返回的行编号
    pub line_ids: Vec<String>,
    pub raw_record: Value,
}

impl CreatedDocument {
    /// 从响应记录中解析编号
    ///
    /// 记录需要包含 `name`，行编号取自 `items[*].name`。
    pub fn from_record(record: Value) -> Option<Self> {
        let assigned_id = record.get("name")?.as_str()?.to_string();
        let line_ids = record
            .get("items")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            assigned_id,
            line_ids,
            raw_record: record,
        })
    }
}

/// 单据服务
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// 创建单据，成功时返回远程编号
    async fn create(&self, request: &CreateRequest) -> Result<CreatedDocument, ServiceError>;
}
