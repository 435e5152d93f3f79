//! 受控操作描述

use super::decision::{Decision, VIEW_PUBLISHED};

/// 受控操作：声明所需的动作与资源类型
///
/// 未声明动作或资源类型的操作不做检查（例如认证入口）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatedOperation {
    pub action: Option<&'static str>,
    pub resource_type: Option<&'static str>,
    /// 决策拒绝时，若权限集合包含此权限仍放行
    pub granted_by: Option<&'static str>,
}

impl GatedOperation {
    pub const UNGATED: Self = Self {
        action: None,
        resource_type: None,
        granted_by: None,
    };

    pub const LIST_ENTRIES: Self = Self::gated("list", "entries");
    pub const VIEW_ENTRY: Self = Self::gated("view", "entry");
    pub const CREATE_ENTRY: Self = Self::gated("create", "entry");
    pub const EDIT_ENTRY: Self = Self::gated("edit", "entry");
    pub const DELETE_ENTRY: Self = Self::gated("delete", "entry");
    pub const PUBLISH_ENTRY: Self = Self::gated("publish", "entry");
    pub const UNPUBLISH_ENTRY: Self = Self::gated("unpublish", "entry");
    pub const LIST_PUBLISHED: Self =
        Self::gated("view", "published_entries").granted_by(VIEW_PUBLISHED);

    pub const fn gated(action: &'static str, resource_type: &'static str) -> Self {
        Self {
            action: Some(action),
            resource_type: Some(resource_type),
            granted_by: None,
        }
    }

    pub const fn granted_by(mut self, permission: &'static str) -> Self {
        self.granted_by = Some(permission);
        self
    }

    /// (动作, 资源类型)；任一缺失则为 None
    pub fn requirement(&self) -> Option<(&'static str, &'static str)> {
        match (self.action, self.resource_type) {
            (Some(action), Some(resource)) => Some((action, resource)),
            _ => None,
        }
    }

    /// 决策是否放行此操作
    ///
    /// 声明了授予权限时，只要权限集合包含它即放行，
    /// 不区分兜底决策与引擎显式给出的 `allow: false`。
    pub fn permits(&self, decision: &Decision) -> bool {
        decision.allow
            || self
                .granted_by
                .is_some_and(|permission| decision.has_permission(permission))
    }
}
