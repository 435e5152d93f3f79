//! 发布快照

use chrono::{DateTime, Utc};
use cms_common::EntryId;
use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// 条目在发布时刻的不可变副本，每个条目至多一份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub entry_id: EntryId,
    pub owner_username: String,
    pub contents: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl PublishedSnapshot {
    pub(super) fn of(entry: &Entry, published_at: DateTime<Utc>) -> Self {
        Self {
            entry_id: entry.id,
            owner_username: entry.owner_username.clone(),
            contents: entry.contents.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            published_at,
        }
    }
}

/// 发布结果
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub entry: Entry,
    pub snapshot: PublishedSnapshot,
    /// 发布前已处于发布状态
    pub republished: bool,
}

impl PublishOutcome {
    /// 对仓储中读到的最新条目执行发布
    pub fn apply(mut entry: Entry, now: DateTime<Utc>) -> Self {
        let republished = entry.is_published();
        let snapshot = entry.publish(now);
        Self {
            entry,
            snapshot,
            republished,
        }
    }
}
