//! 授权问题
//!
//! 发送给策略引擎的输入。字段名保持与策略引擎约定的线上格式一致。

use std::collections::{BTreeMap, BTreeSet};

use cms_common::{ANONYMOUS, Actor, ActorId};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::entry::Entry;

/// 操作者描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorDescriptor {
    pub id: Option<ActorId>,
    pub username: String,
    pub is_authenticated: bool,
    pub is_staff: bool,
    /// 小写角色名，集合语义
    pub groups: BTreeSet<String>,
}

impl From<&Actor> for ActorDescriptor {
    fn from(actor: &Actor) -> Self {
        if !actor.is_authenticated() {
            return Self {
                id: None,
                username: ANONYMOUS.to_string(),
                is_authenticated: false,
                is_staff: false,
                groups: BTreeSet::new(),
            };
        }

        Self {
            id: actor.id,
            username: actor.username.clone(),
            is_authenticated: true,
            is_staff: actor.is_staff,
            groups: actor.roles.iter().map(|r| r.to_lowercase()).collect(),
        }
    }
}

/// 资源属性
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceAttributes(BTreeMap<String, Value>);

impl ResourceAttributes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl From<&Entry> for ResourceAttributes {
    fn from(entry: &Entry) -> Self {
        Self::empty()
            .with("entry_id", entry.id.0)
            .with("owner_id", entry.owner_id.0)
            .with("is_published", entry.is_published())
            .with("created_at", entry.created_at.to_rfc3339())
    }
}

/// 授权问题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizationQuestion {
    pub user: ActorDescriptor,
    pub action: String,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_data: Option<ResourceAttributes>,
}

impl AuthorizationQuestion {
    pub fn new(actor: &Actor, action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            user: ActorDescriptor::from(actor),
            action: action.into(),
            resource: resource.into(),
            resource_data: None,
        }
    }

    pub fn with_resource_data(mut self, attributes: ResourceAttributes) -> Self {
        self.resource_data = Some(attributes);
        self
    }

    /// 规范化后的 JSON 输入
    pub fn to_input(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self).map(canonicalize)
    }

    /// 缓存键: 规范化 JSON 的 SHA-256（十六进制）
    ///
    /// 语义相同的问题（属性顺序、角色顺序不同）得到相同的键。
    pub fn cache_key(&self) -> Result<String, serde_json::Error> {
        Ok(input_key(&self.to_input()?))
    }
}

/// 已规范化输入的缓存键
pub fn input_key(input: &Value) -> String {
    hex::encode(Sha256::digest(input.to_string().as_bytes()))
}

/// 递归地按键名排序对象
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor() -> Actor {
        Actor::authenticated(ActorId(1), "testuser").with_roles(["Editor", "viewer"])
    }

    #[test]
    fn test_anonymous_descriptor() {
        let descriptor = ActorDescriptor::from(&Actor::anonymous());
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(
            json,
            json!({
                "id": null,
                "username": "anonymous",
                "is_authenticated": false,
                "is_staff": false,
                "groups": [],
            })
        );
    }

    #[test]
    fn test_roles_are_lowercased_set() {
        let descriptor = ActorDescriptor::from(&editor());
        let groups: Vec<_> = descriptor.groups.iter().cloned().collect();
        assert_eq!(groups, vec!["editor".to_string(), "viewer".to_string()]);
    }

    #[test]
    fn test_question_wire_shape() {
        let question = AuthorizationQuestion::new(&editor(), "edit", "entry")
            .with_resource_data(ResourceAttributes::empty().with("owner_id", 1));
        let input = question.to_input().unwrap();

        assert_eq!(input["action"], "edit");
        assert_eq!(input["resource"], "entry");
        assert_eq!(input["resource_data"]["owner_id"], 1);
        assert_eq!(input["user"]["username"], "testuser");
        assert_eq!(input["user"]["groups"], json!(["editor", "viewer"]));
    }

    #[test]
    fn test_permissions_question_omits_resource_data() {
        let question = AuthorizationQuestion::new(&editor(), "get_permissions", "user_permissions");
        let input = question.to_input().unwrap();
        assert!(input.get("resource_data").is_none());
    }

    #[test]
    fn test_cache_key_ignores_ordering() {
        let a = AuthorizationQuestion::new(
            &Actor::authenticated(ActorId(1), "u").with_roles(["viewer", "editor"]),
            "view",
            "entry",
        )
        .with_resource_data(
            ResourceAttributes::empty()
                .with("entry_id", 7)
                .with("owner_id", 1),
        );
        let b = AuthorizationQuestion::new(
            &Actor::authenticated(ActorId(1), "u").with_roles(["EDITOR", "Viewer"]),
            "view",
            "entry",
        )
        .with_resource_data(
            ResourceAttributes::empty()
                .with("owner_id", 1)
                .with("entry_id", 7),
        );

        assert_eq!(a.cache_key().unwrap(), b.cache_key().unwrap());
        assert_eq!(a.cache_key().unwrap().len(), 64);
    }

    #[test]
    fn test_cache_key_distinguishes_actions() {
        let view = AuthorizationQuestion::new(&editor(), "view", "entry");
        let edit = AuthorizationQuestion::new(&editor(), "edit", "entry");
        assert_ne!(view.cache_key().unwrap(), edit.cache_key().unwrap());
    }

    #[test]
    fn test_canonicalize_sorts_nested_objects() {
        let value = json!({"b": {"z": 1, "a": [{"y": 2, "x": 1}]}, "a": true});
        let canonical = serde_json::to_string(&canonicalize(value)).unwrap();
        assert_eq!(canonical, r#"{"a":true,"b":{"a":[{"x":1,"y":2}],"z":1}}"#);
    }
}
