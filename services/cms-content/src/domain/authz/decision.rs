//! 授权决策

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 公开内容的基础权限
pub const VIEW_PUBLISHED: &str = "view_published";

fn baseline_permissions() -> BTreeSet<String> {
    BTreeSet::from([VIEW_PUBLISHED.to_string()])
}

/// 策略引擎的裁决
///
/// 缺失 `allow` 视为拒绝，缺失 `permissions` 视为仅有基础权限。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub allow: bool,
    #[serde(default = "baseline_permissions")]
    pub permissions: BTreeSet<String>,
}

impl Decision {
    pub fn allow<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: true,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn deny<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: false,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// 策略引擎不可用时的失败关闭决策
    pub fn fallback() -> Self {
        Self {
            allow: false,
            permissions: baseline_permissions(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

impl Default for Decision {
    /// 策略未定义（响应没有 `result`）时的决策
    fn default() -> Self {
        Self::fallback()
    }
}
