use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use polyroute_model::repo::RepoError;

pub struct AdminError(pub RepoError);

impl From<RepoError> for AdminError {
    fn from(value: RepoError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RepoError::NotFound => StatusCode::NOT_FOUND,
            RepoError::AlreadyExists => StatusCode::CONFLICT,
            RepoError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type AdminResult<T> = Result<T, AdminError>;
