//! 策略引擎客户端
//!
//! 先查决策缓存，未命中时询问策略引擎。引擎不可用时返回失败关闭的
//! 兜底决策，且兜底决策不写入缓存。

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use cms_common::Actor;
use metrics::{counter, histogram};
use tracing::{debug, error};

use super::transport::PolicyTransport;
use crate::domain::authz::{AuthorizationQuestion, Decision, input_key};
use crate::infrastructure::cache::DecisionCache;

/// 权限列表查询的动作与资源
const PERMISSIONS_ACTION: &str = "get_permissions";
const PERMISSIONS_RESOURCE: &str = "user_permissions";

pub struct PolicyEngineClient {
    transport: Arc<dyn PolicyTransport>,
    cache: DecisionCache,
}

impl PolicyEngineClient {
    pub fn new(transport: Arc<dyn PolicyTransport>, cache: DecisionCache) -> Self {
        Self { transport, cache }
    }

    /// 评估授权问题，永不失败
    pub async fn evaluate(&self, question: &AuthorizationQuestion) -> Decision {
        let input = match question.to_input() {
            Ok(input) => input,
            Err(e) => {
                error!(
                    action = %question.action,
                    resource = %question.resource,
                    error = %e,
                    "Failed to encode authorization question, using fallback decision"
                );
                counter!("policy_decisions_total", "source" => "fallback").increment(1);
                return Decision::fallback();
            }
        };
        let key = input_key(&input);

        if let Some(decision) = self.cache.get(&key).await {
            debug!(
                action = %question.action,
                resource = %question.resource,
                allow = decision.allow,
                "Policy decision served from cache"
            );
            counter!("policy_decisions_total", "source" => "cache").increment(1);
            return decision;
        }

        let start = Instant::now();
        let result = self.transport.query(&input).await;
        histogram!("policy_engine_query_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(decision) => {
                debug!(
                    action = %question.action,
                    resource = %question.resource,
                    allow = decision.allow,
                    "Policy decision received"
                );
                self.cache.put(&key, &decision).await;
                counter!("policy_decisions_total", "source" => "engine").increment(1);
                decision
            }
            Err(e) => {
                error!(
                    action = %question.action,
                    resource = %question.resource,
                    error = %e,
                    "Policy engine query failed, using fallback decision"
                );
                counter!("policy_engine_failures_total", "reason" => e.kind()).increment(1);
                counter!("policy_decisions_total", "source" => "fallback").increment(1);
                Decision::fallback()
            }
        }
    }

    /// 操作者的权限集合
    pub async fn list_permissions(&self, actor: &Actor) -> BTreeSet<String> {
        let question = AuthorizationQuestion::new(actor, PERMISSIONS_ACTION, PERMISSIONS_RESOURCE);
        self.evaluate(&question).await.permissions
    }
}
