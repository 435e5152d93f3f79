//! 当前操作者提取器
//!
//! 无 `Authorization` 头视为匿名；令牌无效返回 401。

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use cms_common::Actor;
use cms_errors::AppError;
use tracing::{debug, warn};

use super::AppState;
use super::error::ApiError;

pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(Actor::anonymous()));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Expected a bearer token"))?;

        match state.tokens.authenticate(token) {
            Ok(actor) => {
                debug!(actor = %actor.display_name(), "Token validated");
                Ok(Self(actor))
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                Err(e.into())
            }
        }
    }
}
