//! JSON HTTP 接口

mod actor;
mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use cms_auth_core::TokenService;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

pub use actor::CurrentActor;
pub use error::ApiError;

use crate::application::ContentService;

#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub tokens: TokenService,
    pub metrics: Option<PrometheusHandle>,
    pub database: Option<PgPool>,
}

impl AppState {
    pub fn new(content: Arc<ContentService>, tokens: TokenService) -> Self {
        Self {
            content,
            tokens,
            metrics: None,
            database: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route(
            "/entries/{id}",
            get(handlers::get_entry)
                .put(handlers::edit_entry)
                .delete(handlers::delete_entry),
        )
        .route("/entries/{id}/publish", post(handlers::publish_entry))
        .route("/entries/{id}/unpublish", post(handlers::unpublish_entry))
        .route("/published", get(handlers::list_published))
        .route("/me/permissions", get(handlers::my_permissions))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
