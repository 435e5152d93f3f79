//! CMS Content Service - 内容服务入口

use std::sync::Arc;

use cms_adapter_postgres::{PostgresConfig, create_pool};
use cms_auth_core::TokenService;
use cms_bootstrap::{RuntimeConfig, init_runtime, shutdown_signal};
use cms_common::{Clock, SystemClock};
use cms_config::AppConfig;
use cms_content::api::http::{AppState, router};
use cms_content::application::{ContentService, PermissionGate};
use cms_content::domain::entry::ContentRepository;
use cms_content::infrastructure::cache::{DecisionCache, MemoryCache};
use cms_content::infrastructure::persistence::{
    InMemoryContentRepository, PostgresContentRepository, migrate,
};
use cms_content::infrastructure::policy::{HttpPolicyTransport, PolicyEngineClient};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // 加载配置并初始化运行时
    let runtime = RuntimeConfig::default();
    let config = AppConfig::load(&runtime.config_dir)?;
    init_runtime(&config);

    let metrics = match cms_telemetry::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    };

    // 策略引擎客户端
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = MemoryCache::with_max_capacity(
        clock.clone(),
        config.policy_engine.cache_max_capacity,
    );
    let cache = DecisionCache::new(Arc::new(store)).with_ttl(config.policy_engine.cache_ttl());
    let transport = HttpPolicyTransport::new(&config.policy_engine)?;
    info!(
        decision_url = %transport.decision_url(),
        cache_ttl_secs = config.policy_engine.cache_ttl_secs,
        cache_max_capacity = config.policy_engine.cache_max_capacity,
        "Policy engine client configured"
    );
    let policy = Arc::new(PolicyEngineClient::new(Arc::new(transport), cache));
    let gate = Arc::new(PermissionGate::new(policy));

    // 内容仓储
    let (repo, pool): (Arc<dyn ContentRepository>, Option<PgPool>) = match &config.database {
        Some(database) => {
            let pool = create_pool(&PostgresConfig::from(database)).await?;
            migrate(&pool).await?;
            info!("Database migrations applied");
            let repo: Arc<dyn ContentRepository> =
                Arc::new(PostgresContentRepository::new(pool.clone()));
            (repo, Some(pool))
        }
        None => {
            warn!("No database configured, using in-memory content store");
            let repo: Arc<dyn ContentRepository> = Arc::new(InMemoryContentRepository::new());
            (repo, None)
        }
    };

    let content = Arc::new(
        ContentService::new(gate, repo, clock)
            .with_owner_restriction(config.content.restrict_mutations_to_owner),
    );
    let tokens = TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    );

    let mut state = AppState::new(content, tokens);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    if let Some(pool) = pool {
        state = state.with_database(pool);
    }

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Starting cms-content");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("cms-content stopped");
    Ok(())
}
