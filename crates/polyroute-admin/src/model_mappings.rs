use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use polyroute_model::ModelMapping;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/model-mappings", get(list).post(upsert))
        .route("/model-mappings/{id}", axum::routing::delete(remove))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<ModelMapping>>> {
    Ok(Json(state.mappings.list().await?))
}

async fn upsert(State(state): State<AdminState>, Json(mapping): Json<ModelMapping>) -> AdminResult<Json<ModelMapping>> {
    Ok(Json(state.mappings.upsert(mapping).await?))
}

async fn remove(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.mappings.delete(id).await?;
    Ok(Json(()))
}
