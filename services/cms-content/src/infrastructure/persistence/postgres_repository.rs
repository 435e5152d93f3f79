//! PostgreSQL 内容仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cms_common::{ActorId, EntryId};
use cms_errors::{AppError, AppResult};
use sqlx::PgPool;

use super::error_mapper::map_sqlx_error;
use crate::domain::entry::{ContentRepository, Entry, NewEntry, PublishOutcome, PublishedSnapshot};

/// 执行内嵌的数据库迁移
pub async fn migrate(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Migration failed: {}", e)))
}

pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ENTRY_COLUMNS: &str =
    "id, owner_id, owner_username, contents, created_at, updated_at, published_at";

const SNAPSHOT_COLUMNS: &str =
    "entry_id, owner_username, contents, created_at, updated_at, published_at";

fn entry_not_found(id: EntryId) -> AppError {
    AppError::not_found(format!("Entry {} not found", id))
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn insert(&self, entry: NewEntry) -> AppResult<Entry> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            INSERT INTO entries (owner_id, owner_username, contents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(entry.owner_id.0)
        .bind(&entry.owner_username)
        .bind(&entry.contents)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: EntryId) -> AppResult<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {} FROM entries WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn update(&self, entry: &Entry) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET contents = $2, updated_at = $3, published_at = $4
            WHERE id = $1
            "#,
        )
        .bind(entry.id.0)
        .bind(&entry.contents)
        .bind(entry.updated_at)
        .bind(entry.published_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(entry_not_found(entry.id));
        }
        Ok(())
    }

    async fn delete(&self, id: EntryId) -> AppResult<bool> {
        // published_entries 通过 ON DELETE CASCADE 级联删除
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_newest_first(&self) -> AppResult<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {} FROM entries ORDER BY created_at DESC, id DESC",
            ENTRY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<PublishOutcome> {
        // 使用事务保证条目与快照同时生效
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // 行锁阻止并发修改插入读与写之间
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {} FROM entries WHERE id = $1 FOR UPDATE",
            ENTRY_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        // tx 被丢弃时回滚
        let stored: Entry = row.ok_or_else(|| entry_not_found(id))?.into();
        let outcome = PublishOutcome::apply(stored, now);

        sqlx::query("UPDATE entries SET updated_at = $2, published_at = $3 WHERE id = $1")
            .bind(id.0)
            .bind(outcome.entry.updated_at)
            .bind(outcome.entry.published_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let snapshot = &outcome.snapshot;
        sqlx::query(
            r#"
            INSERT INTO published_entries (entry_id, owner_username, contents, created_at, updated_at, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (entry_id) DO UPDATE
            SET owner_username = EXCLUDED.owner_username,
                contents = EXCLUDED.contents,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                published_at = EXCLUDED.published_at
            "#,
        )
        .bind(snapshot.entry_id.0)
        .bind(&snapshot.owner_username)
        .bind(&snapshot.contents)
        .bind(snapshot.created_at)
        .bind(snapshot.updated_at)
        .bind(snapshot.published_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(outcome)
    }

    async fn withdraw_publication(&self, id: EntryId, now: DateTime<Utc>) -> AppResult<Entry> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {} FROM entries WHERE id = $1 FOR UPDATE",
            ENTRY_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut entry: Entry = row.ok_or_else(|| entry_not_found(id))?.into();
        entry.unpublish(now);

        sqlx::query("UPDATE entries SET updated_at = $2, published_at = $3 WHERE id = $1")
            .bind(id.0)
            .bind(entry.updated_at)
            .bind(entry.published_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM published_entries WHERE entry_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(entry)
    }

    async fn find_snapshot(&self, id: EntryId) -> AppResult<Option<PublishedSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT {} FROM published_entries WHERE entry_id = $1",
            SNAPSHOT_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_snapshots_newest_first(&self) -> AppResult<Vec<PublishedSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT {} FROM published_entries ORDER BY published_at DESC, entry_id DESC",
            SNAPSHOT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    owner_id: i64,
    owner_username: String,
    contents: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: EntryId(row.id),
            owner_id: ActorId(row.owner_id),
            owner_username: row.owner_username,
            contents: row.contents,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    entry_id: i64,
    owner_username: String,
    contents: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: DateTime<Utc>,
}

impl From<SnapshotRow> for PublishedSnapshot {
    fn from(row: SnapshotRow) -> Self {
        PublishedSnapshot {
            entry_id: EntryId(row.entry_id),
            owner_username: row.owner_username,
            contents: row.contents,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        }
    }
}
