use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use polyroute_model::Provider;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/providers", get(list).post(upsert))
        .route("/providers/{id}", get(get_one).delete(remove))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<Provider>>> {
    Ok(Json(state.providers.list().await?))
}

async fn get_one(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<Provider>> {
    Ok(Json(state.providers.get(id).await?))
}

async fn upsert(State(state): State<AdminState>, Json(provider): Json<Provider>) -> AdminResult<Json<Provider>> {
    Ok(Json(state.providers.upsert(provider).await?))
}

async fn remove(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.providers.delete(id).await?;
    Ok(Json(()))
}
