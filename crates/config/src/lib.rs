//! cms-config - 配置加载库

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
///
/// 未配置时服务使用内存存储
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 根据环境自动调整连接池大小
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// 策略引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyEngineConfig {
    #[serde(default = "default_policy_url")]
    pub url: String,
    #[serde(default = "default_policy_path")]
    pub policy_path: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 进程内决策缓存最大条目数
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,
    #[serde(default = "default_policy_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_policy_url() -> String {
    "http://localhost:8181".to_string()
}

fn default_policy_path() -> String {
    "cms/authz".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_capacity() -> u64 {
    10_000
}

fn default_policy_timeout_secs() -> f64 {
    5.0
}

impl Default for PolicyEngineConfig {
    fn default() -> Self {
        Self {
            url: default_policy_url(),
            policy_path: default_policy_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_capacity: default_cache_max_capacity(),
            timeout_secs: default_policy_timeout_secs(),
        }
    }
}

impl PolicyEngineConfig {
    /// 决策查询地址: `{url}/v1/data/{policy_path}`
    pub fn decision_url(&self) -> String {
        format!(
            "{}/v1/data/{}",
            self.url.trim_end_matches('/'),
            self.policy_path.trim_matches('/')
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// 请求超时；非法值在 `AppConfig::validate` 中已被拒绝
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_policy_timeout_secs()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "policy_engine.timeout_secs must be a positive number, got {}",
                self.timeout_secs
            )));
        }
        if self.cache_max_capacity == 0 {
            return Err(ConfigError::Invalid(
                "policy_engine.cache_max_capacity must be greater than zero".to_string(),
            ));
        }
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "policy_engine.url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// JWT 配置（验证身份提供方签发的令牌）
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_issuer() -> String {
    "cms-identity".to_string()
}

fn default_audience() -> String {
    "cms".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// 内容服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// 编辑/删除/发布/撤回仅对条目所有者可见
    #[serde(default = "default_true")]
    pub restrict_mutations_to_owner: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            restrict_mutations_to_owner: true,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub policy_engine: PolicyEngineConfig,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级: `default.toml` < `{APP_ENV}.toml` < `CMS_` 前缀环境变量（`__` 分隔层级）
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config: Self = Self::figment(config_dir, &env).extract()?;
        config.validate()?;

        Ok(config)
    }

    fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("CMS_").split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy_engine.validate()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
