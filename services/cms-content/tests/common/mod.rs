//! 集成测试共用的策略引擎替身与服务装配

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cms_common::{Actor, ActorId, ManualClock};
use cms_content::application::{ContentService, PermissionGate};
use cms_content::domain::authz::Decision;
use cms_content::domain::entry::ContentRepository;
use cms_content::infrastructure::cache::{DecisionCache, MemoryCache};
use cms_content::infrastructure::persistence::InMemoryContentRepository;
use cms_content::infrastructure::policy::{PolicyEngineClient, PolicyTransport, PolicyUnavailable};
use serde_json::Value;

/// 按角色授予动作的策略引擎替身
pub struct RolePolicyEngine {
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl RolePolicyEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        })
    }

    pub fn offline() -> Arc<Self> {
        let engine = Self::new();
        engine.set_offline(true);
        engine
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn grants(role: &str) -> &'static [&'static str] {
        match role {
            "viewer" => &["list", "view"],
            "editor" => &["list", "view", "create", "edit", "delete"],
            "publisher" => &["list", "view", "publish", "unpublish"],
            _ => &[],
        }
    }
}

#[async_trait]
impl PolicyTransport for RolePolicyEngine {
    async fn query(&self, input: &Value) -> Result<Decision, PolicyUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(PolicyUnavailable::Network("connection refused".to_string()));
        }

        let mut permissions: BTreeSet<String> = BTreeSet::from(["view_published".to_string()]);
        for role in input["user"]["groups"].as_array().into_iter().flatten() {
            let role = role.as_str().unwrap_or_default();
            permissions.extend(Self::grants(role).iter().map(|p| p.to_string()));
        }

        let action = input["action"].as_str().unwrap_or_default();
        let allow = match (action, input["resource"].as_str().unwrap_or_default()) {
            ("get_permissions", "user_permissions") => true,
            (_, "published_entries") => true,
            (action, _) => permissions.contains(action),
        };

        Ok(Decision {
            allow,
            permissions,
        })
    }
}

/// 固定返回同一决策的策略引擎替身
pub struct StaticEngine(pub Decision);

#[async_trait]
impl PolicyTransport for StaticEngine {
    async fn query(&self, _input: &Value) -> Result<Decision, PolicyUnavailable> {
        Ok(self.0.clone())
    }
}

pub struct Harness {
    pub service: Arc<ContentService>,
    pub repo: Arc<InMemoryContentRepository>,
    pub clock: Arc<ManualClock>,
}

/// 在给定仓储之上装配内容服务
pub fn service_over(
    transport: Arc<dyn PolicyTransport>,
    repo: Arc<dyn ContentRepository>,
    clock: Arc<ManualClock>,
    restrict_to_owner: bool,
) -> Arc<ContentService> {
    let cache = DecisionCache::new(Arc::new(MemoryCache::new(clock.clone())))
        .with_ttl(Duration::from_secs(300));
    let policy = Arc::new(PolicyEngineClient::new(transport, cache));
    let gate = Arc::new(PermissionGate::new(policy));

    Arc::new(
        ContentService::new(gate, repo, clock).with_owner_restriction(restrict_to_owner),
    )
}

pub fn harness_with(transport: Arc<dyn PolicyTransport>, restrict_to_owner: bool) -> Harness {
    let clock = Arc::new(ManualClock::default());
    let repo = Arc::new(InMemoryContentRepository::new());
    let service = service_over(transport, repo.clone(), clock.clone(), restrict_to_owner);

    Harness {
        service,
        repo,
        clock,
    }
}

pub fn harness(transport: Arc<dyn PolicyTransport>) -> Harness {
    harness_with(transport, true)
}

pub fn viewer() -> Actor {
    Actor::authenticated(ActorId(10), "vera").with_roles(["Viewer"])
}

pub fn editor() -> Actor {
    Actor::authenticated(ActorId(20), "eddie").with_roles(["editor"])
}

pub fn publisher() -> Actor {
    Actor::authenticated(ActorId(30), "pat").with_roles(["editor", "publisher"])
}
