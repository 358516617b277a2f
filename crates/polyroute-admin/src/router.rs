use axum::Router;
use axum::middleware;

use crate::auth::require_admin_token;
use crate::state::AdminState;
use crate::{
    api_tokens, cooldowns, events, history, model_mappings, projects, providers, retry_configs,
    routes, strategies, system_settings,
};

/// CRUD surface (§4.10), meant to be `.nest("/admin", admin_router(state))`
/// by the binary crate.
pub fn admin_router(state: AdminState) -> Router {
    tracing::info!("mounting admin CRUD surface");
    Router::new()
        .route("/health", axum::routing::get(health))
        .merge(providers::router())
        .merge(projects::router())
        .merge(routes::router())
        .merge(strategies::router())
        .merge(retry_configs::router())
        .merge(model_mappings::router())
        .merge(system_settings::router())
        .merge(api_tokens::router())
        .merge(cooldowns::router())
        .merge(history::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_admin_token))
        .with_state(state)
}

/// `/ws`, mounted at the application root per the external interface
/// table rather than under `/admin` (§6).
pub fn events_router(state: AdminState) -> Router {
    events::router()
        .layer(middleware::from_fn_with_state(state.clone(), require_admin_token))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
