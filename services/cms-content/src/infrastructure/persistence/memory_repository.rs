//! 内存内容仓储
//!
//! 条目与快照放在同一把写锁下，跨两者的写操作天然原子。

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cms_common::EntryId;
use cms_errors::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::domain::entry::{ContentRepository, Entry, NewEntry, PublishOutcome, PublishedSnapshot};

#[derive(Default)]
struct ContentState {
    next_id: i64,
    entries: BTreeMap<EntryId, Entry>,
    snapshots: BTreeMap<EntryId, PublishedSnapshot>,
}

impl ContentState {
    fn entry_mut(&mut self, id: EntryId) -> AppResult<&mut Entry> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Entry {} not found", id)))
    }
}

#[derive(Default)]
pub struct InMemoryContentRepository {
    state: RwLock<ContentState>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn insert(&self, entry: NewEntry) -> AppResult<Entry> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let entry = entry.into_entry(EntryId(state.next_id));
        state.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_by_id(&self, id: EntryId) -> AppResult<Option<Entry>> {
        Ok(self.state.read().await.entries.get(&id).cloned())
    }

    async fn update(&self, entry: &Entry) -> AppResult<()> {
        let mut state = self.state.write().await;
        *state.entry_mut(entry.id)? = entry.clone();
        Ok(())
    }

    async fn delete(&self, id: EntryId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        state.snapshots.remove(&id);
        Ok(state.entries.remove(&id).is_some())
    }

    async fn list_newest_first(&self) -> AppResult<Vec<Entry>> {
        let state = self.state.read().await;
        let mut entries: Vec<Entry> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn save_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<PublishOutcome> {
        let mut state = self.state.write().await;
        let stored = state.entry_mut(id)?;
        let outcome = PublishOutcome::apply(stored.clone(), now);
        *stored = outcome.entry.clone();
        state.snapshots.insert(id, outcome.snapshot.clone());
        Ok(outcome)
    }

    async fn withdraw_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<Entry> {
        let mut state = self.state.write().await;
        let stored = state.entry_mut(id)?;
        stored.unpublish(now);
        let entry = stored.clone();
        state.snapshots.remove(&id);
        Ok(entry)
    }

    async fn find_snapshot(&self, id: EntryId) -> AppResult<Option<PublishedSnapshot>> {
        Ok(self.state.read().await.snapshots.get(&id).cloned())
    }

    async fn list_snapshots_newest_first(&self) -> AppResult<Vec<PublishedSnapshot>> {
        let state = self.state.read().await;
        let mut snapshots: Vec<PublishedSnapshot> = state.snapshots.values().cloned().collect();
        snapshots.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.entry_id.cmp(&a.entry_id))
        });
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use cms_common::{Actor, ActorId};

    fn alice() -> Actor {
        Actor::authenticated(ActorId(1), "alice")
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();

        let first = repo.insert(NewEntry::draft(&alice(), "a", now).unwrap()).await.unwrap();
        let second = repo.insert(NewEntry::draft(&alice(), "b", now).unwrap()).await.unwrap();

        assert_eq!(first.id, EntryId(1));
        assert_eq!(second.id, EntryId(2));
        assert_eq!(repo.find_by_id(EntryId(2)).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_list_newest_first_breaks_ties_by_id() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();

        repo.insert(NewEntry::draft(&alice(), "old", now - Duration::hours(1)).unwrap())
            .await
            .unwrap();
        repo.insert(NewEntry::draft(&alice(), "a", now).unwrap()).await.unwrap();
        repo.insert(NewEntry::draft(&alice(), "b", now).unwrap()).await.unwrap();

        let contents: Vec<String> = repo
            .list_newest_first()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.contents)
            .collect();
        assert_eq!(contents, vec!["b", "a", "old"]);
    }

    #[tokio::test]
    async fn test_publication_upserts_single_snapshot() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();
        let mut entry = repo.insert(NewEntry::draft(&alice(), "v1", now).unwrap()).await.unwrap();

        let first = repo.save_publication(entry.id, now).await.unwrap();
        assert!(!first.republished);

        entry.edit("v2", now + Duration::seconds(1)).unwrap();
        repo.update(&entry).await.unwrap();
        let second = repo
            .save_publication(entry.id, now + Duration::seconds(2))
            .await
            .unwrap();
        assert!(!second.republished);

        let snapshots = repo.list_snapshots_newest_first().await.unwrap();
        assert_eq!(snapshots, vec![second.snapshot]);
        assert_eq!(snapshots[0].contents, "v2");
    }

    #[tokio::test]
    async fn test_publication_uses_stored_contents() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();
        let stale = repo.insert(NewEntry::draft(&alice(), "v1", now).unwrap()).await.unwrap();

        let mut edited = stale.clone();
        edited.edit("v2", now + Duration::seconds(1)).unwrap();
        repo.update(&edited).await.unwrap();

        let outcome = repo
            .save_publication(stale.id, now + Duration::seconds(2))
            .await
            .unwrap();
        assert_eq!(outcome.entry.contents, "v2");
        assert_eq!(outcome.snapshot.contents, "v2");
        let stored = repo.find_by_id(stale.id).await.unwrap().unwrap();
        assert_eq!(stored, outcome.entry);
    }

    #[tokio::test]
    async fn test_publication_of_missing_entry_changes_nothing() {
        let repo = InMemoryContentRepository::new();

        let err = repo.save_publication(EntryId(42), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.find_snapshot(EntryId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_snapshot() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();
        let entry = repo.insert(NewEntry::draft(&alice(), "v1", now).unwrap()).await.unwrap();
        repo.save_publication(entry.id, now).await.unwrap();

        assert!(repo.delete(entry.id).await.unwrap());
        assert!(repo.find_snapshot(entry.id).await.unwrap().is_none());
        assert!(!repo.delete(entry.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_withdraw_removes_snapshot() {
        let repo = InMemoryContentRepository::new();
        let now = Utc::now();
        let entry = repo.insert(NewEntry::draft(&alice(), "v1", now).unwrap()).await.unwrap();
        repo.save_publication(entry.id, now).await.unwrap();

        let withdrawn = repo.withdraw_publication(entry.id, now).await.unwrap();

        assert!(!withdrawn.is_published());
        assert!(repo.find_snapshot(entry.id).await.unwrap().is_none());
        let stored = repo.find_by_id(entry.id).await.unwrap().unwrap();
        assert_eq!(stored, withdrawn);
    }

    #[tokio::test]
    async fn test_withdraw_of_missing_entry_is_not_found() {
        let repo = InMemoryContentRepository::new();

        let err = repo.withdraw_publication(EntryId(7), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
