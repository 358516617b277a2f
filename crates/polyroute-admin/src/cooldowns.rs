use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use polyroute_model::Cooldown;

use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/cooldowns", get(snapshot))
        .route("/cooldowns/{provider_id}/clear", post(clear))
}

async fn snapshot(State(state): State<AdminState>) -> Json<Vec<Cooldown>> {
    Json(state.cooldowns.snapshot())
}

/// Manual operator override; clears every client-type entry for the
/// provider, same as the grounding codebase's admin "unstick" action.
async fn clear(State(state): State<AdminState>, Path(provider_id): Path<i64>) -> Json<()> {
    state.cooldowns.clear(provider_id);
    Json(())
}
