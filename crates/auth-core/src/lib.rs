//! cms-auth-core - 认证核心库
//!
//! 校验身份提供方签发的 JWT，并转换为 `Actor`

use chrono::{Duration, Utc};
use cms_common::{Actor, ActorId};
use cms_errors::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Staff flag
    #[serde(default)]
    pub is_staff: bool,
    /// Roles / groups
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    pub fn actor_id(&self) -> AppResult<ActorId> {
        self.sub
            .parse::<i64>()
            .map(ActorId)
            .map_err(|_| AppError::unauthenticated("Invalid user ID in token"))
    }

    /// 转换为请求操作者
    pub fn to_actor(&self) -> AppResult<Actor> {
        Ok(Actor::authenticated(self.actor_id()?, self.name.clone())
            .with_staff(self.is_staff)
            .with_roles(self.roles.iter().cloned()))
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: i64, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            issuer,
            audience,
        }
    }

    /// 签发访问令牌（开发环境与测试中代替身份提供方）
    pub fn generate_access_token(&self, actor: &Actor) -> AppResult<String> {
        let id = actor
            .id
            .ok_or_else(|| AppError::internal("Cannot issue a token for an anonymous actor"))?;
        let now = Utc::now();
        let claims = Claims {
            sub: id.to_string(),
            name: actor.username.clone(),
            is_staff: actor.is_staff,
            roles: actor.roles.clone(),
            exp: (now + Duration::seconds(self.expires_in)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// 验证令牌并转换为操作者
    pub fn authenticate(&self, token: &str) -> AppResult<Actor> {
        self.validate_token(token)?.to_actor()
    }
}
