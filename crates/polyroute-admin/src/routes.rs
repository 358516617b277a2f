use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use polyroute_common::ClientType;
use polyroute_model::Route;
use serde::Deserialize;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/routes", get(list).post(upsert))
        .route("/routes/{id}", get(get_one).delete(remove))
        .route("/routes/renumber", post(renumber))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<Route>>> {
    Ok(Json(state.routes.list_all().await?))
}

async fn get_one(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<Route>> {
    Ok(Json(state.routes.get(id).await?))
}

async fn upsert(State(state): State<AdminState>, Json(route): Json<Route>) -> AdminResult<Json<Route>> {
    Ok(Json(state.routes.upsert(route).await?))
}

async fn remove(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.routes.delete(id).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct RenumberRequest {
    project_id: i64,
    client_type: ClientType,
    ordered_route_ids: Vec<i64>,
}

async fn renumber(State(state): State<AdminState>, Json(body): Json<RenumberRequest>) -> AdminResult<Json<()>> {
    state
        .routes
        .renumber(body.project_id, body.client_type, body.ordered_route_ids)
        .await?;
    Ok(Json(()))
}
