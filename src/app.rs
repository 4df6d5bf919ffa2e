/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS / security headers / request-id / trace / limits)
 * - axum::serve() で起動 (peer アドレスを ConnectInfo で渡す)
 */
use std::{net::SocketAddr, panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::repos::role_repo::RoleRepo;
use crate::services::auth::jwt::JwtIssuer;
use crate::services::auth::role_cache::CachedRoleLookup;
use crate::services::auth::token_issuer::RoleLookup;
use crate::services::auth::{GatewayPolicy, TokenIssuer, TrustBoundary};
use crate::services::cache::{CacheClient, ValkeyClient};
use crate::services::security::AttackSignatures;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,gateway_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash the whole process so we notice immediately
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();

    // Production with a missing or default JWT secret stops here.
    let config = Config::from_env().context("load configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(?config, "starting API in {:?} mode", config.app_env);

    let state = build_state(&config).await?;
    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    tracing::info!("listening on {}", config.addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("connect to postgres")?;

    let signatures = Arc::new(AttackSignatures::new().context("compile attack signatures")?);

    let gateway = Arc::new(GatewayPolicy {
        trust: TrustBoundary::from_peers(config.trusted_proxies.clone()),
        require_role: config.gateway_require_role,
    });
    if matches!(gateway.trust, TrustBoundary::Gateway) {
        tracing::warn!(
            "TRUSTED_PROXIES not set; identity headers are accepted from any peer. \
             The gateway must be the only network path to this service."
        );
    }

    let db_roles: Arc<dyn RoleLookup> = Arc::new(RoleRepo::new(db.clone()));
    let role_cache = match &config.redis_url {
        Some(url) => build_role_cache(url, Arc::clone(&db_roles), config.role_cache_ttl).await,
        None => None,
    };
    let roles: Arc<dyn RoleLookup> = match &role_cache {
        Some(cache) => Arc::clone(cache) as Arc<dyn RoleLookup>,
        None => db_roles,
    };

    let jwt = JwtIssuer::new(
        &config.jwt.secret,
        config.jwt.access_token_ttl_seconds,
        config.jwt.refresh_token_ttl_seconds,
    );
    let tokens = Arc::new(TokenIssuer::new(jwt, Some(roles), config.request_timeout));

    Ok(AppState::new(db, tokens, gateway, signatures, role_cache))
}

// The cache is optional: an unreachable backend degrades to DB-only lookups.
async fn build_role_cache(
    url: &str,
    inner: Arc<dyn RoleLookup>,
    ttl: Duration,
) -> Option<Arc<CachedRoleLookup<ValkeyClient>>> {
    match ValkeyClient::new(url).await {
        Ok(client) => {
            tracing::info!(backend = client.backend_name(), "role cache enabled");
            Some(Arc::new(CachedRoleLookup::new(inner, client, ttl)))
        }
        Err(err) => {
            tracing::warn!(error = %err, "role cache unavailable; falling back to database");
            None
        }
    }
}

fn build_router(state: AppState, config: &Config) -> Result<Router> {
    let v1 = api::v1::routes(&state).context("build v1 routes")?;
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    Ok(middleware::http::apply(router, config))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
