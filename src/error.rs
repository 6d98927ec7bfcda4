use thiserror::Error;

use crate::models::StageType;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命，终止整个运行）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 远程单据服务错误（单据级别，可隔离）
    #[error("单据服务错误: {0}")]
    Service(#[from] ServiceError),
    /// 主数据缺失（候选单据级别，跳过）
    #[error("主数据缺失: {0}")]
    MasterData(#[from] MasterDataError),
    /// 台账写入错误
    #[error("台账错误: {0}")]
    Ledger(#[from] LedgerError),
    /// 流程控制信号
    #[error("流程错误: {0}")]
    Pipeline(#[from] PipelineError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 日期范围或目标数量非法
    #[error("非法的运行范围: {start} ~ {end}, 目标数量 {total}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        total: u32,
    },
    /// 主数据文件不存在
    #[error("主数据文件不存在: {path}")]
    MasterDataFileMissing { path: String },
    /// 主数据文件无法解析
    #[error("主数据文件解析失败 ({path}): {source}")]
    MasterDataParseFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// 主数据中没有可用的采购组件
    #[error("物料组 {item_group} 下没有可用物料")]
    NoComponents { item_group: String },
    /// 配置文件读取失败
    #[error("配置文件读取失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 断点文件与本次运行参数不一致
    #[error("断点文件 {path} 与本次运行参数不一致")]
    CheckpointMismatch { path: String },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// 单据服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非成功状态
    #[error("服务返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应中缺少单据编号
    #[error("响应中缺少单据编号 ({endpoint})")]
    MissingIdentifier { endpoint: String },
    /// 请求或响应 JSON 处理失败
    #[error("JSON处理失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 服务拒绝（测试替身与其他实现使用）
    #[error("服务拒绝 {natural_key}: {reason}")]
    Rejected { natural_key: String, reason: String },
}

/// 主数据缺失
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MasterDataError {
    /// 物料没有对应的供应商
    #[error("物料 {item_code} 没有对应的供应商")]
    SupplierMissing { item_code: String },
    /// 物料不在物料目录中
    #[error("物料 {item_code} 不在物料目录中")]
    ItemMissing { item_code: String },
    /// 采购组件物料组下没有任何物料
    #[error("物料组 {item_group} 下没有可用物料")]
    NoComponents { item_group: String },
    /// 批次管理物料没有批次号
    #[error("批次管理物料 {item_code} 没有批次号")]
    BatchMissing { item_code: String },
    /// 上游单据尚未获得编号
    #[error("上游单据 {natural_key} 尚未获得编号")]
    UpstreamUncommitted { natural_key: String },
}

/// 台账写入错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 创建目录或打开文件失败
    #[error("台账文件写入失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 序列化失败
    #[error("台账CSV写入失败 ({path}): {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// 读取已有文件失败
    #[error("文件读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 断点文件序列化失败
    #[error("断点文件处理失败 ({path}): {source}")]
    Manifest {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 流程控制信号
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// 某个阶段没有任何成功单据
    #[error("阶段 {stage} 在 {month} 没有成功单据")]
    StageExhausted { stage: StageType, month: String },
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Ledger(LedgerError::WriteFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Service(ServiceError::Json(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Ledger(LedgerError::Csv {
            path: String::new(),
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Service(ServiceError::RequestFailed {
            endpoint: err.url().map(|u| u.to_string()).unwrap_or_default(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建主数据文件缺失错误
    pub fn master_data_file_missing(path: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MasterDataFileMissing { path: path.into() })
    }

    /// 创建台账写入错误
    pub fn ledger_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Ledger(LedgerError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn ledger_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Ledger(LedgerError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为致命错误（应立即终止运行）
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Ledger(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_ledger_errors_are_fatal() {
        let err = AppError::master_data_file_missing("data/master/base/items.csv");
        assert!(err.is_fatal());

        let err = AppError::ledger_write_failed(
            "out/run/order.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn per_item_errors_are_not_fatal() {
        let err = AppError::from(MasterDataError::SupplierMissing {
            item_code: "BK-100".into(),
        });
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("BK-100"));

        let err = AppError::from(ServiceError::Rejected {
            natural_key: "PO-202301-0001".into(),
            reason: "validation".into(),
        });
        assert!(!err.is_fatal());
    }

    #[test]
    fn third_party_errors_convert_into_their_layer() {
        let csv_err = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("abc".as_bytes())
            .deserialize::<(u32,)>()
            .next()
            .unwrap()
            .unwrap_err();
        let err = AppError::from(csv_err);
        assert!(matches!(err, AppError::Ledger(LedgerError::Csv { .. })));
        assert!(err.is_fatal());

        let toml_err = toml::from_str::<crate::config::Config>("api_base_url = ").unwrap_err();
        let err = AppError::from(toml_err);
        assert!(matches!(
            err,
            AppError::Config(ConfigError::TomlParseFailed { .. })
        ));
        assert!(err.is_fatal());

        let reqwest_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = AppError::from(reqwest_err);
        assert!(matches!(
            err,
            AppError::Service(ServiceError::RequestFailed { .. })
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn read_failures_are_not_reported_as_writes() {
        let err = AppError::ledger_read_failed(
            "out/run/manifest.json",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "bad"),
        );
        assert!(matches!(err, AppError::Ledger(LedgerError::ReadFailed { .. })));
        assert!(err.to_string().contains("读取失败"));
        assert!(err.is_fatal());
    }
}
