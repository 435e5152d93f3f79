//! 策略引擎传输层

use async_trait::async_trait;
use cms_config::PolicyEngineConfig;
use cms_errors::{AppError, AppResult};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::authz::Decision;

/// 策略引擎不可用
#[derive(Debug, Error)]
pub enum PolicyUnavailable {
    #[error("Policy engine request timed out")]
    Timeout,

    #[error("Policy engine unreachable: {0}")]
    Network(String),

    #[error("Policy engine returned status {0}")]
    Status(u16),

    #[error("Malformed policy engine response: {0}")]
    Malformed(String),
}

impl PolicyUnavailable {
    /// 指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::Status(_) => "status",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// 向策略引擎提交规范化输入并取回决策
#[async_trait]
pub trait PolicyTransport: Send + Sync {
    async fn query(&self, input: &Value) -> Result<Decision, PolicyUnavailable>;
}

#[derive(Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    result: Option<Decision>,
}

/// HTTP 传输: `POST {url}/v1/data/{policy_path}`
pub struct HttpPolicyTransport {
    client: reqwest::Client,
    decision_url: String,
}

impl HttpPolicyTransport {
    pub fn new(config: &PolicyEngineConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build policy HTTP client: {}", e)))?;

        Ok(Self {
            client,
            decision_url: config.decision_url(),
        })
    }

    pub fn decision_url(&self) -> &str {
        &self.decision_url
    }
}

fn classify(error: reqwest::Error) -> PolicyUnavailable {
    if error.is_timeout() {
        PolicyUnavailable::Timeout
    } else {
        PolicyUnavailable::Network(error.to_string())
    }
}

#[async_trait]
impl PolicyTransport for HttpPolicyTransport {
    async fn query(&self, input: &Value) -> Result<Decision, PolicyUnavailable> {
        let response = self
            .client
            .post(&self.decision_url)
            .json(&json!({ "input": input }))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PolicyUnavailable::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify)?;
        let parsed: PolicyResponse = serde_json::from_slice(&body)
            .map_err(|e| PolicyUnavailable::Malformed(e.to_string()))?;

        // 无 result: 策略未定义
        Ok(parsed.result.unwrap_or_default())
    }
}
