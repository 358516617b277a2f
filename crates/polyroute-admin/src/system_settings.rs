use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use polyroute_common::GlobalConfig;
use polyroute_model::SystemSetting;
use polyroute_model::system_setting::{KEY_FORCE_PROJECT_BINDING, KEY_FORCE_PROJECT_TIMEOUT};
use serde::Deserialize;

use crate::error::AdminResult;
use crate::state::AdminState;

pub fn router() -> Router<AdminState> {
    Router::new()
        .route("/system-settings", get(list))
        .route("/system-settings/{key}", get(get_one).put(set))
}

async fn list(State(state): State<AdminState>) -> AdminResult<Json<Vec<SystemSetting>>> {
    Ok(Json(state.settings.list().await?))
}

async fn get_one(State(state): State<AdminState>, Path(key): Path<String>) -> AdminResult<Json<Option<SystemSetting>>> {
    Ok(Json(state.settings.get(&key).await?))
}

#[derive(Debug, Deserialize)]
struct SetValue {
    value: String,
}

/// Validates the force-project-binding pair before writing through, same
/// bounds `GlobalConfig::clamp_force_project_timeout` enforces at
/// bootstrap (§4.11).
async fn set(State(state): State<AdminState>, Path(key): Path<String>, Json(body): Json<SetValue>) -> Result<Json<()>, Response> {
    if key == KEY_FORCE_PROJECT_BINDING && body.value != "true" && body.value != "false" {
        return Err((StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "force_project_binding must be \"true\" or \"false\"" }))).into_response());
    }
    if key == KEY_FORCE_PROJECT_TIMEOUT {
        let parsed: u32 = body
            .value
            .parse()
            .map_err(|_| (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "force_project_timeout must be an integer" }))).into_response())?;
        let clamped = GlobalConfig::clamp_force_project_timeout(parsed);
        state.settings.set(&key, &clamped.to_string()).await.map_err(|err| crate::error::AdminError(err).into_response())?;
        return Ok(Json(()));
    }
    state.settings.set(&key, &body.value).await.map_err(|err| crate::error::AdminError(err).into_response())?;
    Ok(Json(()))
}
