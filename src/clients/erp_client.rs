/// ERP API 客户端
///
/// 封装所有与 ERP `resource` 接口相关的调用逻辑
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::clients::document_client::{CreateRequest, CreatedDocument, DocumentService};
use crate::config::Config;
use crate::error::{AppResult, ConfigError, ServiceError};

/// ERP API 客户端
pub struct ErpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// 失败请求转储目录，`None` 表示不转储
    payload_dump_dir: Option<PathBuf>,
}

/// 失败响应的摘要，用于转储
struct FailedResponse {
    status: u16,
    body: String,
}

impl ErpClient {
    /// 创建新的 ERP 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            payload_dump_dir: config
                .dump_failed_payloads
                .then(|| config.api_payload_dir()),
        })
    }

    fn endpoint(&self, request: &CreateRequest) -> String {
        format!("{}/resource/{}", self.base_url, request.stage.doctype())
    }

    async fn post(&self, request: &CreateRequest) -> Result<CreatedDocument, ServiceError> {
        let endpoint = self.endpoint(request);
        debug!("创建 {} Payload: {}", request.natural_key, request.body);

        let response = self
            .http
            .post(&endpoint)
            .header("Authorization", format!("token {}", self.api_key))
            .header("Accept", "application/json")
            .json(&request.body)
            .send()
            .await
            .map_err(|source| ServiceError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            self.dump_failed_payload(
                request,
                &format!("API request failed: {}", status.as_u16()),
                Some(FailedResponse {
                    status: status.as_u16(),
                    body: body.clone(),
                }),
            )
            .await;
            return Err(ServiceError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = serde_json::from_str(&body)?;
        let record = Self::extract_record(parsed);

        CreatedDocument::from_record(record).ok_or(ServiceError::MissingIdentifier { endpoint })
    }

    /// 提取响应中的单据记录
    ///
    /// 接口把记录放在 `data` 或 `message` 下，两者都没有时整个响应即为记录。
    pub fn extract_record(response: Value) -> Value {
        match response {
            Value::Object(mut map) => {
                if let Some(message) = map.remove("message") {
                    message
                } else if let Some(data) = map.remove("data") {
                    data
                } else {
                    Value::Object(map)
                }
            }
            other => other,
        }
    }

    /// 写入失败请求转储，转储本身失败只记录警告
    async fn dump_failed_payload(
        &self,
        request: &CreateRequest,
        error_message: &str,
        response: Option<FailedResponse>,
    ) {
        let Some(dir) = &self.payload_dump_dir else {
            return;
        };

        let now = chrono::Local::now();
        let mut dump = json!({
            "error_message": error_message,
            "timestamp": now.to_rfc3339(),
            "endpoint": request.stage.doctype(),
            "natural_key": request.natural_key,
            "request": {
                "url": self.endpoint(request),
                "headers": {
                    "Accept": "application/json",
                    "Content-Type": "application/json"
                },
                "payload": request.body,
            }
        });
        if let Some(response) = response {
            dump["response"] = json!({
                "status_code": response.status,
                "body": response.body,
            });
        }

        let path = dir.join(format!(
            "failed_{}_{}_{}.json",
            request.stage.name(),
            request.natural_key,
            now.format("%Y%m%d_%H%M%S")
        ));

        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            let content = serde_json::to_vec_pretty(&dump)?;
            tokio::fs::write(&path, content).await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
        }
        .await;

        match result {
            Ok(()) => debug!("失败请求已转储: {}", path.display()),
            Err(e) => warn!("⚠️ 失败请求转储失败 ({}): {}", path.display(), e),
        }
    }
}

#[async_trait]
impl DocumentService for ErpClient {
    async fn create(&self, request: &CreateRequest) -> Result<CreatedDocument, ServiceError> {
        match self.post(request).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if !matches!(e, ServiceError::BadResponse { .. }) {
                    self.dump_failed_payload(request, &e.to_string(), None).await;
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_unwrapped_from_message_or_data() {
        let record = ErpClient::extract_record(json!({"message": {"name": "ACC-PAY-1"}}));
        assert_eq!(record["name"], "ACC-PAY-1");

        let record = ErpClient::extract_record(json!({"data": {"name": "ACC-PINV-1"}}));
        assert_eq!(record["name"], "ACC-PINV-1");

        let record = ErpClient::extract_record(json!({"name": "MAT-PRE-1"}));
        assert_eq!(record["name"], "MAT-PRE-1");
    }

    #[test]
    fn endpoint_uses_doctype() {
        let config = Config {
            api_base_url: "https://erp.example.com/api/".into(),
            ..Config::default()
        };
        let client = ErpClient::new(&config).unwrap();
        let request = CreateRequest {
            stage: crate::models::StageType::Invoice,
            natural_key: "PI-202301-0001".into(),
            body: json!({}),
        };
        assert_eq!(
            client.endpoint(&request),
            "https://erp.example.com/api/resource/Purchase Invoice"
        );
    }

    const API_KEY: &str = "secret-token-123";

    fn client_for(base_url: &str, log_dir: &std::path::Path) -> (ErpClient, PathBuf) {
        let config = Config {
            api_base_url: base_url.into(),
            api_key: API_KEY.into(),
            request_timeout_secs: 5,
            log_dir: log_dir.to_path_buf(),
            dump_failed_payloads: true,
            ..Config::default()
        };
        (ErpClient::new(&config).unwrap(), config.api_payload_dir())
    }

    fn order_request() -> CreateRequest {
        CreateRequest {
            stage: crate::models::StageType::Order,
            natural_key: "PO-202301-0001".into(),
            body: json!({"doctype": "Purchase Order", "supplier": "SUP-0001"}),
        }
    }

    /// 读取转储目录下唯一的文件
    fn single_dump(dir: &std::path::Path) -> (String, String) {
        let entries: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
        (name, std::fs::read_to_string(&entries[0]).unwrap())
    }

    #[tokio::test]
    async fn unreachable_service_dumps_payload_without_credentials() {
        let logs = tempfile::tempdir().unwrap();
        let (client, dump_dir) = client_for("http://127.0.0.1:9", logs.path());

        let err = client.create(&order_request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::RequestFailed { .. }));

        let (name, content) = single_dump(&dump_dir);
        assert!(name.starts_with("failed_purchase_orders_PO-202301-0001_"));
        assert!(name.ends_with(".json"));
        assert!(content.contains("PO-202301-0001"));
        assert!(content.contains("SUP-0001"));
        assert!(!content.contains(API_KEY));
    }

    #[tokio::test]
    async fn rejected_request_dumps_status_and_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            // 读完请求头和请求体后再响应
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket
                .write_all(
                    b"HTTP/1.1 417 Expectation Failed\r\nContent-Length: 7\r\nConnection: close\r\n\r\nrefused",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        let logs = tempfile::tempdir().unwrap();
        let (client, dump_dir) = client_for(&format!("http://{}", addr), logs.path());

        let err = client.create(&order_request()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::BadResponse { status: 417, ref body, .. } if body == "refused"
        ));

        let request_text = server.await.unwrap();
        assert!(request_text.contains(&format!("token {}", API_KEY)));

        let (name, content) = single_dump(&dump_dir);
        assert!(name.starts_with("failed_purchase_orders_"));
        let dump: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(dump["response"]["status_code"], 417);
        assert_eq!(dump["response"]["body"], "refused");
        assert!(!content.contains(API_KEY));
    }
}
