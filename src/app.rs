/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → PgPool → 依存生成 (directory, boundary, provisioner) → Router 組み立て
 * - Middleware の適用 (CORS / request-id / trace / limit / timeout)
 * - axum::serve() で起動
 */
use std::{panic, sync::Arc};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppEnv, AuthConfig, Config, HttpConfig};
use crate::middleware::{self, cors::CorsPolicy};
use crate::repos::{rbac_repo::PgRbacStore, user_repo::PgPrincipalDirectory};
use crate::services::auth::build_auth_boundary;
use crate::services::rbac::{PermissionProvisioner, SchemaIntrospector};
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,crm_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    // No ANSI colours in production; log collectors store the raw bytes.
    let ansi = !AppEnv::from_env().is_production();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(ansi))
        .init();
}

// The verify guard turns a panicking request task into a 401, so the hook
// only records the panic and never aborts the process.
fn init_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook();

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    let state = build_state(&config, pool).await?;
    let app = build_router(state, &config.auth, &config.http)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config, pool: sqlx::PgPool) -> Result<AppState> {
    let rbac_store = Arc::new(PgRbacStore::new(pool.clone()));

    // The directory's permission query depends on whether grants carry an
    // `active` flag; decided once here. Provisioning re-inspects per run.
    let schema = SchemaIntrospector::new(rbac_store.as_ref())
        .inspect()
        .await?;
    tracing::info!(?schema, "role_permissions schema");

    let directory = Arc::new(PgPrincipalDirectory::new(pool, schema));
    let auth = build_auth_boundary(config, directory)?;

    let provisioner = Arc::new(PermissionProvisioner::new(rbac_store));

    Ok(AppState::new(auth, provisioner))
}

pub fn build_router(state: AppState, auth: &AuthConfig, http: &HttpConfig) -> Result<Router> {
    let cors = CorsPolicy::new(auth).map_err(anyhow::Error::msg)?;
    let v1 = middleware::cors::apply(api::v1::routes(), cors);

    let router = Router::new().nest("/api/v1", v1).with_state(state);

    Ok(middleware::http::apply(router, http))
}
