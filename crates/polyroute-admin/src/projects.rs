use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use polyroute_model::Project;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/projects", get(list).post(upsert))
        .route("/projects/{id}", get(get_one).delete(remove))
        .route("/projects/by-slug/{slug}", get(get_by_slug))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list().await?))
}

async fn get_one(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<Project>> {
    Ok(Json(state.projects.get(id).await?))
}

async fn get_by_slug(State(state): State<AdminState>, Path(slug): Path<String>) -> AdminResult<Json<Project>> {
    Ok(Json(state.projects.get_by_slug(&slug).await?))
}

async fn upsert(State(state): State<AdminState>, Json(project): Json<Project>) -> AdminResult<Json<Project>> {
    Ok(Json(state.projects.upsert(project).await?))
}

async fn remove(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.projects.delete(id).await?;
    Ok(Json(()))
}
