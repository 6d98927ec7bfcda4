use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- ERP API 配置 ---
    pub api_base_url: String,
    pub api_key: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,

    // --- 目录 ---
    /// 主数据目录（包含 base/ 与 mappings/）
    pub master_data_dir: PathBuf,
    /// 台账输出目录，每次运行一个子目录
    pub output_dir: PathBuf,
    /// 运行日志与失败请求转储目录
    pub log_dir: PathBuf,
    /// 是否转储失败请求
    pub dump_failed_payloads: bool,

    // --- 公司设置 ---
    pub company: CompanySettings,

    /// 随机种子，设置后单据生成可复现
    pub seed: Option<u64>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

/// 公司与会计科目设置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    pub company: String,
    pub currency: String,
    pub conversion_rate: f64,
    pub warehouse: String,
    /// 参与采购的物料组
    pub component_item_group: String,
    /// 每张采购订单的数量
    pub order_quantity: f64,
    pub tax_rate_percent: f64,
    pub tax_account: String,
    pub tax_description: String,
    pub credit_to_account: String,
    pub expense_account: String,
    pub cost_center: String,
    pub bank_account: String,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company: "Velo GmbH".to_string(),
            currency: "EUR".to_string(),
            conversion_rate: 1.0,
            warehouse: "Lager Stuttgart - B".to_string(),
            component_item_group: "Fahrradkomponenten".to_string(),
            order_quantity: 500.0,
            tax_rate_percent: 19.0,
            tax_account: "1406 - Abziehbare Vorsteuer 19 % - B".to_string(),
            tax_description: "Abziehbare Vorsteuer 19 %".to_string(),
            credit_to_account: "3500 - Sonstige Verb. - B".to_string(),
            expense_account:
                "5000 - Aufwendungen f. Roh-, Hilfs- und Betriebsstoffe und f. bezogene Waren - B"
                    .to_string(),
            cost_center: "Main - B".to_string(),
            bank_account: "Bank Account - B".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
            master_data_dir: PathBuf::from("data/master"),
            output_dir: PathBuf::from("data/generated"),
            log_dir: PathBuf::from("logs"),
            dump_failed_payloads: true,
            company: CompanySettings::default(),
            seed: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;

        Ok(config)
    }

    /// 用环境变量覆盖配置
    pub fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            api_base_url: std::env::var("ERP_API_BASE_URL").unwrap_or(self.api_base_url),
            api_key: std::env::var("ERP_API_KEY").unwrap_or(self.api_key),
            request_timeout_secs: env_parse("ERP_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            master_data_dir: std::env::var("MASTER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.master_data_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.output_dir),
            log_dir: std::env::var("LOG_DIR").map(PathBuf::from).unwrap_or(self.log_dir),
            dump_failed_payloads: env_parse("DUMP_FAILED_PAYLOADS", "bool")?
                .unwrap_or(self.dump_failed_payloads),
            seed: env_parse("GENERATOR_SEED", "u64")?.or(self.seed),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
            company: self.company,
        })
    }

    /// 默认配置加环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 失败请求转储目录
    pub fn api_payload_dir(&self) -> PathBuf {
        self.log_dir.join("api_payloads")
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base_url = "https://erp.example.com/api"
seed = 42

[company]
company = "Test AG"
order_quantity = 20.0
"#
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://erp.example.com/api");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.company.company, "Test AG");
        assert_eq!(config.company.order_quantity, 20.0);
        assert_eq!(config.company.currency, "EUR");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = Config::from_toml_file(Path::new("/nonexistent/procurement.toml")).unwrap_err();
        assert!(err.is_fatal());
    }
}
