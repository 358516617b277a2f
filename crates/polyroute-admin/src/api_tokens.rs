use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use polyroute_model::ApiToken;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/api-tokens", get(list).post(create))
        .route("/api-tokens/{id}/revoke", post(revoke))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<ApiToken>>> {
    Ok(Json(state.api_tokens.list().await?))
}

#[derive(Debug, Deserialize)]
struct CreateTokenRequest {
    token: String,
    label: String,
}

/// Stores only the hash (§10.9); the plaintext value is returned once in
/// the response and never persisted.
async fn create(State(state): State<AdminState>, Json(body): Json<CreateTokenRequest>) -> AdminResult<Json<ApiToken>> {
    let token = ApiToken {
        id: 0,
        token_hash: blake3::hash(body.token.as_bytes()).to_hex().to_string(),
        label: body.label,
        created_at: OffsetDateTime::now_utc(),
        revoked_at: None,
    };
    Ok(Json(state.api_tokens.insert(token).await?))
}

async fn revoke(State(state): State<AdminState>, Path(id): Path<i64>) -> AdminResult<Json<()>> {
    state.api_tokens.revoke(id, OffsetDateTime::now_utc()).await?;
    Ok(Json(()))
}
