use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use polyroute_model::RoutingStrategy;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/routing-strategies/{project_id}", get(get_for_project))
        .route("/routing-strategies", get(get_for_global).post(upsert))
}

async fn get_for_project(State(state): State<AdminState>, Path(project_id): Path<i64>) -> AdminResult<Json<RoutingStrategy>> {
    Ok(Json(state.strategies.get_for_project(project_id).await?))
}

async fn get_for_global(State(state): State<AdminState>) -> AdminResult<Json<RoutingStrategy>> {
    Ok(Json(state.strategies.get_for_project(polyroute_model::GLOBAL_PROJECT_ID).await?))
}

async fn upsert(State(state): State<AdminState>, Json(strategy): Json<RoutingStrategy>) -> AdminResult<Json<RoutingStrategy>> {
    Ok(Json(state.strategies.upsert(strategy).await?))
}
