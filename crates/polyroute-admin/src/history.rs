use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use polyroute_model::{ProxyRequest, ProxyUpstreamAttempt};
use serde::Deserialize;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/proxy-requests", get(list_requests))
        .route("/proxy-requests/{id}", get(get_request))
        .route("/proxy-requests/{id}/attempts", get(list_attempts_for_request))
        .route("/proxy-attempts", get(list_attempts))
}

#[derive(Debug, Deserialize)]
struct Page {
    limit: Option<usize>,
    offset: Option<usize>,
}

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

fn bounded_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

async fn list_requests(State(state): State<AdminState>, Query(page): Query<Page>) -> AdminResult<Json<Vec<ProxyRequest>>> {
    let requests = state
        .requests
        .list_recent(bounded_limit(page.limit), page.offset.unwrap_or(0))
        .await?;
    Ok(Json(requests))
}

async fn get_request(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<ProxyRequest>> {
    Ok(Json(state.requests.get(id).await?))
}

async fn list_attempts_for_request(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<Vec<ProxyUpstreamAttempt>>> {
    Ok(Json(state.attempts.list_for_request(id).await?))
}

async fn list_attempts(State(state): State<AdminState>, Query(page): Query<Page>) -> AdminResult<Json<Vec<ProxyUpstreamAttempt>>> {
    let attempts = state
        .attempts
        .list_recent(bounded_limit(page.limit), page.offset.unwrap_or(0))
        .await?;
    Ok(Json(attempts))
}
