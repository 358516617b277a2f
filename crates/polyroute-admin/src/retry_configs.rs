use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use polyroute_model::RetryConfig;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/retry-configs", get(list).post(upsert))
        .route("/retry-configs/default", get(get_default))
        .route("/retry-configs/{id}", get(get_one).delete(remove))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<RetryConfig>>> {
    Ok(Json(state.retry_configs.list().await?))
}

async fn get_default(State(state): State<AdminState>) -> AdminResult<Json<RetryConfig>> {
    Ok(Json(state.retry_configs.get_default().await?))
}

async fn get_one(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<RetryConfig>> {
    Ok(Json(state.retry_configs.get(id).await?))
}

async fn upsert(State(state): State<AdminState>, Json(config): Json<RetryConfig>) -> AdminResult<Json<RetryConfig>> {
    Ok(Json(state.retry_configs.upsert(config).await?))
}

async fn remove(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.retry_configs.delete(id).await?;
    Ok(Json(()))
}
