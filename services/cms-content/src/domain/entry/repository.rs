//! 内容仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cms_common::EntryId;
use cms_errors::AppResult;

use super::{Entry, NewEntry, PublishOutcome, PublishedSnapshot};

/// 内容仓储接口
///
/// 条目与快照属于同一聚合；跨两者的写操作必须原子执行。
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// 插入条目并分配 ID
    async fn insert(&self, entry: NewEntry) -> AppResult<Entry>;

    /// 根据 ID 查找条目
    async fn find_by_id(&self, id: EntryId) -> AppResult<Option<Entry>>;

    /// 更新条目（正文、修改时间、发布时间），条目不存在时返回 NotFound
    async fn update(&self, entry: &Entry) -> AppResult<()>;

    /// 删除条目并级联删除快照，返回是否存在
    async fn delete(&self, id: EntryId) -> AppResult<bool>;

    /// 按创建时间倒序列出条目
    async fn list_newest_first(&self) -> AppResult<Vec<Entry>>;

    /// 原子地发布条目并 upsert 快照
    ///
    /// 快照取自同一原子单元内读到的条目，不会覆盖并发提交的修改。
    async fn save_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<PublishOutcome>;

    /// 原子地撤回发布并删除快照，返回撤回后的条目
    async fn withdraw_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<Entry>;

    /// 查找条目的快照
    async fn find_snapshot(&self, id: EntryId) -> AppResult<Option<PublishedSnapshot>>;

    /// 按发布时间倒序列出快照
    async fn list_snapshots_newest_first(&self) -> AppResult<Vec<PublishedSnapshot>>;
}
