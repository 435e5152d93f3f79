//! HTTP 处理器

use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use cms_common::{ActorId, EntryId};
use cms_telemetry::HealthStatus;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::actor::CurrentActor;
use super::error::ApiError;
use crate::domain::entry::{Entry, PublishedSnapshot};

type ApiResult<T> = Result<T, ApiError>;

// ============ 请求与响应 ============

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    /// 缺失按空白处理，由领域校验拒绝
    #[serde(default)]
    pub contents: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: EntryId,
    pub owner_id: ActorId,
    pub owner_username: String,
    pub contents: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_published: bool,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            is_published: entry.is_published(),
            id: entry.id,
            owner_id: entry.owner_id,
            owner_username: entry.owner_username,
            contents: entry.contents,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            published_at: entry.published_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub entry_id: EntryId,
    pub owner_username: String,
    pub contents: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl From<PublishedSnapshot> for SnapshotResponse {
    fn from(snapshot: PublishedSnapshot) -> Self {
        Self {
            entry_id: snapshot.entry_id,
            owner_username: snapshot.owner_username,
            contents: snapshot.contents,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            published_at: snapshot.published_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub entry: EntryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub entry: EntryResponse,
    pub snapshot: SnapshotResponse,
    pub republished: bool,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub permissions: BTreeSet<String>,
}

// ============ 条目 ============

pub async fn list_entries(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let entries = state.content.list_entries(&actor).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn get_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.content.get_entry(&actor, EntryId(id)).await?;
    Ok(Json(entry.into()))
}

pub async fn create_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<EntryRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let entry = state.content.create_entry(&actor, &req.contents).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn edit_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(req): Json<EntryRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state
        .content
        .edit_entry(&actor, EntryId(id), &req.contents)
        .await?;
    let notice = outcome.notice().map(str::to_string);

    Ok(Json(EditResponse {
        entry: outcome.entry.into(),
        notice,
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.content.delete_entry(&actor, EntryId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<PublishResponse>> {
    let outcome = state.content.publish_entry(&actor, EntryId(id)).await?;

    Ok(Json(PublishResponse {
        entry: outcome.entry.into(),
        snapshot: outcome.snapshot.into(),
        republished: outcome.republished,
    }))
}

pub async fn unpublish_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.content.unpublish_entry(&actor, EntryId(id)).await?;
    Ok(Json(entry.into()))
}

// ============ 已发布内容 ============

pub async fn list_published(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<Vec<SnapshotResponse>>> {
    let snapshots = state.content.list_published(&actor).await?;
    Ok(Json(snapshots.into_iter().map(Into::into).collect()))
}

pub async fn my_permissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        permissions: state.content.permissions(&actor).await,
    })
}

// ============ 运维 ============

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();

    match &state.database {
        Some(pool) => match cms_adapter_postgres::check_connection(pool).await {
            Ok(()) => status.add_check("database", true, None),
            Err(e) => status.add_check("database", false, Some(e.to_string())),
        },
        None => status.add_check("store", true, Some("in-memory".to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
