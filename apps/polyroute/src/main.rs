use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::get;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod auth;
mod bootstrap;
mod cli;
mod connection;
mod dsn;
mod proxy;

use auth::{ProxyAuthState, require_api_token};
use cli::CliArgs;
use proxy::ProxyState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    let boot = bootstrap::bootstrap(args).await?;

    let proxy_state = ProxyState {
        global: boot.global.clone(),
        executor: boot.executor.clone(),
        session_waiter: boot.session_waiter.clone(),
        sessions: boot.sessions.clone(),
    };
    let proxy_auth_state = ProxyAuthState {
        api_tokens: boot.api_tokens.clone(),
    };

    let proxied = proxy::proxy_router(proxy_state)
        .layer(axum::middleware::from_fn_with_state(proxy_auth_state, require_api_token));

    let app = axum::Router::new()
        .route("/health", get(health))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .merge(proxied)
        .nest("/admin", polyroute_admin::admin_router(boot.admin_state.clone()))
        .merge(polyroute_admin::events_router(boot.admin_state.clone()));

    let bind = {
        let global = boot.global.load();
        format!("{}:{}", global.host, global.port)
    };
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "polyroute listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
