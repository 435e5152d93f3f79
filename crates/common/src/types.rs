//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// 操作者 ID（由身份提供方分配）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ActorId(pub i64);

/// 内容条目 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct EntryId(pub i64);

/// 匿名操作者的显示名
pub const ANONYMOUS: &str = "anonymous";

/// 发起请求的操作者
///
/// `id` 为空表示未认证（匿名）。身份提供方负责填充其余字段，
/// 核心逻辑只读取，不做任何角色判断。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Option<ActorId>,
    pub username: String,
    pub is_staff: bool,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: ANONYMOUS.to_string(),
            is_staff: false,
            roles: Vec::new(),
        }
    }

    pub fn authenticated(id: ActorId, username: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            username: username.into(),
            is_staff: false,
            roles: Vec::new(),
        }
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    /// 审计日志中使用的名称
    pub fn display_name(&self) -> &str {
        if self.is_authenticated() {
            &self.username
        } else {
            ANONYMOUS
        }
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_actor() {
        let actor = Actor::anonymous();
        assert!(!actor.is_authenticated());
        assert_eq!(actor.display_name(), "anonymous");
        assert!(actor.roles.is_empty());
    }

    #[test]
    fn test_authenticated_actor_builder() {
        let actor = Actor::authenticated(ActorId(42), "alice")
            .with_staff(true)
            .with_roles(["Editor", "viewer"]);

        assert!(actor.is_authenticated());
        assert_eq!(actor.display_name(), "alice");
        assert!(actor.is_staff);
        assert_eq!(actor.roles, vec!["Editor".to_string(), "viewer".to_string()]);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(EntryId(7).to_string(), "7");
        assert_eq!(ActorId::from(3).to_string(), "3");
    }
}
