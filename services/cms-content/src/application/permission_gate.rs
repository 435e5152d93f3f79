//! 权限门
//!
//! 在操作执行前询问策略引擎。门本身不含任何角色判断，
//! 只执行 allow/deny 约定。

use std::future::Future;
use std::sync::Arc;

use cms_common::Actor;
use cms_errors::{AppError, AppResult};
use tracing::{debug, warn};

use crate::domain::authz::{AuthorizationQuestion, GatedOperation, ResourceAttributes};
use crate::infrastructure::policy::PolicyEngineClient;

pub struct PermissionGate {
    policy: Arc<PolicyEngineClient>,
}

impl PermissionGate {
    pub fn new(policy: Arc<PolicyEngineClient>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyEngineClient {
        &self.policy
    }

    /// 检查操作是否放行
    ///
    /// `resource` 提供资源属性；无法解析（`None`）时使用空属性继续检查。
    /// 未声明动作或资源类型的操作直接放行，且不解析资源。
    pub async fn check<F>(&self, actor: &Actor, operation: GatedOperation, resource: F) -> AppResult<()>
    where
        F: Future<Output = Option<ResourceAttributes>> + Send,
    {
        let Some((action, resource_type)) = operation.requirement() else {
            return Ok(());
        };

        let attributes = match resource.await {
            Some(attributes) => attributes,
            None => {
                debug!(action, resource = resource_type, "Resource not resolvable, checking with empty attributes");
                ResourceAttributes::empty()
            }
        };

        let question =
            AuthorizationQuestion::new(actor, action, resource_type).with_resource_data(attributes);
        let decision = self.policy.evaluate(&question).await;

        if operation.permits(&decision) {
            return Ok(());
        }

        warn!(
            actor = %actor.display_name(),
            action,
            resource = resource_type,
            "Access denied by policy"
        );
        Err(AppError::forbidden(format!(
            "Access denied: {} on {}",
            action, resource_type
        )))
    }
}
