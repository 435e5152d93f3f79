//! 内容生命周期服务
//!
//! 每个操作先过权限门，再读取或修改条目。

use std::collections::BTreeSet;
use std::sync::Arc;

use cms_common::{Actor, Clock, EntryId};
use cms_errors::{AppError, AppResult};
use tracing::info;

use super::permission_gate::PermissionGate;
use crate::domain::authz::{GatedOperation, ResourceAttributes};
use crate::domain::entry::{ContentRepository, Entry, NewEntry, PublishOutcome, PublishedSnapshot};

/// 修改已发布条目后给调用方的提示
pub const UNPUBLISHED_NOTICE: &str =
    "Entry unpublished due to changes. You can republish it from the list view.";

/// 修改结果
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub entry: Entry,
    /// 修改前是否处于发布状态
    pub unpublished: bool,
}

impl EditOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        self.unpublished.then_some(UNPUBLISHED_NOTICE)
    }
}

pub struct ContentService {
    gate: Arc<PermissionGate>,
    repo: Arc<dyn ContentRepository>,
    clock: Arc<dyn Clock>,
    restrict_to_owner: bool,
}

impl ContentService {
    pub fn new(
        gate: Arc<PermissionGate>,
        repo: Arc<dyn ContentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate,
            repo,
            clock,
            restrict_to_owner: true,
        }
    }

    /// 是否只允许所有者解析可修改的条目
    pub fn with_owner_restriction(mut self, restrict: bool) -> Self {
        self.restrict_to_owner = restrict;
        self
    }

    async fn resolve(&self, id: EntryId) -> AppResult<Entry> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entry {} not found", id)))
    }

    /// 解析可修改的条目；他人的条目按不存在处理
    async fn resolve_mutable(&self, actor: &Actor, id: EntryId) -> AppResult<Entry> {
        let entry = self.resolve(id).await?;
        if self.restrict_to_owner && !entry.is_owned_by(actor) {
            return Err(AppError::not_found(format!("Entry {} not found", id)));
        }
        Ok(entry)
    }

    async fn guard(
        &self,
        actor: &Actor,
        operation: GatedOperation,
        resolved: &AppResult<Entry>,
    ) -> AppResult<()> {
        self.gate
            .check(actor, operation, async {
                resolved.as_ref().ok().map(ResourceAttributes::from)
            })
            .await
    }

    /// 条目列表（按创建时间倒序）
    pub async fn list_entries(&self, actor: &Actor) -> AppResult<Vec<Entry>> {
        self.gate
            .check(actor, GatedOperation::LIST_ENTRIES, async {
                Some(ResourceAttributes::empty())
            })
            .await?;
        self.repo.list_newest_first().await
    }

    pub async fn get_entry(&self, actor: &Actor, id: EntryId) -> AppResult<Entry> {
        let resolved = self.resolve(id).await;
        self.guard(actor, GatedOperation::VIEW_ENTRY, &resolved).await?;
        resolved
    }

    pub async fn create_entry(&self, actor: &Actor, contents: &str) -> AppResult<Entry> {
        self.gate
            .check(actor, GatedOperation::CREATE_ENTRY, async {
                Some(ResourceAttributes::empty())
            })
            .await?;

        let draft = NewEntry::draft(actor, contents, self.clock.now())?;
        let entry = self.repo.insert(draft).await?;

        info!(entry_id = %entry.id, owner = %entry.owner_username, "Entry created");
        Ok(entry)
    }

    pub async fn edit_entry(
        &self,
        actor: &Actor,
        id: EntryId,
        contents: &str,
    ) -> AppResult<EditOutcome> {
        let resolved = self.resolve_mutable(actor, id).await;
        self.guard(actor, GatedOperation::EDIT_ENTRY, &resolved).await?;

        let mut entry = resolved?;
        let unpublished = entry.edit(contents, self.clock.now())?;
        self.repo.update(&entry).await?;

        info!(entry_id = %entry.id, unpublished, "Entry edited");
        Ok(EditOutcome { entry, unpublished })
    }

    pub async fn delete_entry(&self, actor: &Actor, id: EntryId) -> AppResult<()> {
        let resolved = self.resolve_mutable(actor, id).await;
        self.guard(actor, GatedOperation::DELETE_ENTRY, &resolved).await?;

        let entry = resolved?;
        if !self.repo.delete(entry.id).await? {
            return Err(AppError::not_found(format!("Entry {} not found", id)));
        }

        info!(entry_id = %entry.id, "Entry deleted");
        Ok(())
    }

    /// 发布；已发布的条目重新盖时间戳并刷新快照
    pub async fn publish_entry(&self, actor: &Actor, id: EntryId) -> AppResult<PublishOutcome> {
        let resolved = self.resolve_mutable(actor, id).await;
        self.guard(actor, GatedOperation::PUBLISH_ENTRY, &resolved).await?;

        let entry = resolved?;
        let outcome = self.repo.save_publication(entry.id, self.clock.now()).await?;

        info!(entry_id = %entry.id, republished = outcome.republished, "Entry published");
        Ok(outcome)
    }

    /// 撤回发布
    ///
    /// 同时删除快照，包括修改后遗留的旧快照；草稿撤回无其他效果。
    pub async fn unpublish_entry(&self, actor: &Actor, id: EntryId) -> AppResult<Entry> {
        let resolved = self.resolve_mutable(actor, id).await;
        self.guard(actor, GatedOperation::UNPUBLISH_ENTRY, &resolved).await?;

        let was_published = resolved?.is_published();
        let entry = self.repo.withdraw_publication(id, self.clock.now()).await?;

        info!(entry_id = %entry.id, was_published, "Entry unpublished");
        Ok(entry)
    }

    /// 已发布快照列表（按发布时间倒序）
    pub async fn list_published(&self, actor: &Actor) -> AppResult<Vec<PublishedSnapshot>> {
        self.gate
            .check(actor, GatedOperation::LIST_PUBLISHED, async {
                Some(ResourceAttributes::empty())
            })
            .await?;
        self.repo.list_snapshots_newest_first().await
    }

    /// 操作者的权限集合（不经过权限门）
    pub async fn permissions(&self, actor: &Actor) -> BTreeSet<String> {
        self.gate.policy().list_permissions(actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cms_common::ActorId;

    fn entry() -> Entry {
        NewEntry::draft(&Actor::authenticated(ActorId(1), "alice"), "v1", Utc::now())
            .unwrap()
            .into_entry(EntryId(1))
    }

    #[test]
    fn test_notice_only_when_unpublished() {
        let demoted = EditOutcome {
            entry: entry(),
            unpublished: true,
        };
        assert_eq!(demoted.notice(), Some(UNPUBLISHED_NOTICE));

        let draft = EditOutcome {
            entry: entry(),
            unpublished: false,
        };
        assert_eq!(draft.notice(), None);
    }
}
