//! 内容条目实体

use chrono::{DateTime, Utc};
use cms_common::{Actor, ActorId, EntryId};
use cms_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::snapshot::PublishedSnapshot;

/// 内容条目（可编辑）
///
/// 状态机: Draft (`published_at = None`) ⇄ Published (`published_at = Some`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: ActorId,
    pub owner_username: String,
    pub contents: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// 待插入的条目，ID 由仓储分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner_id: ActorId,
    pub owner_username: String,
    pub contents: String,
    pub created_at: DateTime<Utc>,
}

impl NewEntry {
    /// 以当前操作者为所有者创建草稿
    pub fn draft(owner: &Actor, contents: &str, now: DateTime<Utc>) -> AppResult<Self> {
        let owner_id = owner
            .id
            .ok_or_else(|| AppError::unauthenticated("Anonymous actors cannot own entries"))?;

        Ok(Self {
            owner_id,
            owner_username: owner.username.clone(),
            contents: validate_contents(contents)?,
            created_at: now,
        })
    }

    pub fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            owner_id: self.owner_id,
            owner_username: self.owner_username,
            contents: self.contents,
            created_at: self.created_at,
            updated_at: self.created_at,
            published_at: None,
        }
    }
}

/// 校验正文：不允许为空白
pub fn validate_contents(contents: &str) -> AppResult<String> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("contents must not be blank"));
    }
    Ok(trimmed.to_string())
}

impl Entry {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        actor.id == Some(self.owner_id)
    }

    /// 修改正文；已发布的条目退回草稿。返回修改前是否已发布。
    ///
    /// 快照不在此处变动，直到下一次发布或删除。
    pub fn edit(&mut self, contents: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let contents = validate_contents(contents)?;
        let was_published = self.is_published();

        self.contents = contents;
        self.updated_at = now;
        self.published_at = None;

        Ok(was_published)
    }

    /// 发布：盖发布时间戳并生成对应快照
    pub fn publish(&mut self, now: DateTime<Utc>) -> PublishedSnapshot {
        // published_at >= created_at
        let published_at = now.max(self.created_at);
        self.published_at = Some(published_at);
        self.updated_at = published_at.max(self.updated_at);

        PublishedSnapshot::of(self, published_at)
    }

    /// 撤回发布。返回撤回前是否已发布。
    pub fn unpublish(&mut self, now: DateTime<Utc>) -> bool {
        let was_published = self.is_published();
        if was_published {
            self.published_at = None;
            self.updated_at = now.max(self.updated_at);
        }
        was_published
    }
}
