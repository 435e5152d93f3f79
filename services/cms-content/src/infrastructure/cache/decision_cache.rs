//! 授权决策缓存

use std::sync::Arc;
use std::time::Duration;

use cms_ports::CachePort;
use tracing::warn;

use crate::domain::authz::Decision;

/// 默认决策缓存 TTL：5 分钟
pub const DEFAULT_DECISION_TTL: Duration = Duration::from_secs(300);

/// 决策缓存
///
/// 后端故障只记录日志并按未命中处理，不影响授权流程。
pub struct DecisionCache {
    cache: Arc<dyn CachePort>,
    ttl: Duration,
}

impl DecisionCache {
    pub fn new(cache: Arc<dyn CachePort>) -> Self {
        Self {
            cache,
            ttl: DEFAULT_DECISION_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn decision_key(question_key: &str) -> String {
        format!("cms:authz:decision:{}", question_key)
    }

    pub async fn get(&self, question_key: &str) -> Option<Decision> {
        let key = Self::decision_key(question_key);
        let json = match self.cache.get(&key).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Decision cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(decision) => Some(decision),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cached decision");
                None
            }
        }
    }

    pub async fn put(&self, question_key: &str, decision: &Decision) {
        let key = Self::decision_key(question_key);
        let json = match serde_json::to_string(decision) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize decision for cache");
                return;
            }
        };

        if let Err(e) = self.cache.set(&key, &json, Some(self.ttl)).await {
            warn!(key = %key, error = %e, "Decision cache write failed");
        }
    }
}
