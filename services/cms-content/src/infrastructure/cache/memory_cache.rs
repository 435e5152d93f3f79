//! 进程内 TTL 缓存
//!
//! `CachePort` 的内存实现，基于 moka。
//! 过期判断读取注入的时钟；moka 负责容量上限和过期条目的回收。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cms_common::Clock;
use cms_errors::AppResult;
use cms_ports::CachePort;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 默认最大条目数
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Option<Duration>,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedValue {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// 按条目 TTL 回收
struct EntryTtl;

impl Expiry<String, CachedValue> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// 内存缓存
pub struct MemoryCache {
    entries: MokaCache<String, CachedValue>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_capacity(clock, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_max_capacity(clock: Arc<dyn Clock>, max_capacity: u64) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self { entries, clock }
    }

    /// 当前条目数（先执行挂起的淘汰任务）
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn expiry(&self, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
        ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| self.clock.now() + ttl)
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = self.clock.now();
        match self.entries.get(key).await {
            Some(cached) if !cached.is_expired(now) => Ok(Some(cached.value)),
            Some(_) => {
                self.entries.invalidate(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let cached = CachedValue {
            value: value.to_string(),
            ttl,
            expires_at: self.expiry(ttl),
        };
        self.entries.insert(key.to_string(), cached).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
