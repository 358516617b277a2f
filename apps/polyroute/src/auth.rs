//! Constant-time API-token check for the client-facing proxy endpoints
//! (§6). Mirrors `polyroute_admin::auth`'s header/bearer/query extraction,
//! but checks the presented token against every active `ApiToken` row
//! rather than a single `GlobalConfig` field.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;

use polyroute_common::constant_time_eq;
use polyroute_model::repo::ApiTokenRepo;

#[derive(Clone)]
pub struct ProxyAuthState {
    pub api_tokens: Arc<dyn ApiTokenRepo>,
}

pub async fn require_api_token(
    State(state): State<ProxyAuthState>,
    headers: HeaderMap,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = extract_token(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let presented_hash = blake3::hash(presented.as_bytes()).to_hex().to_string();

    let tokens = state.api_tokens.list().await.map_err(|err| {
        tracing::error!(?err, "failed to load api tokens");
        StatusCode::UNAUTHORIZED
    })?;

    let matched = tokens
        .iter()
        .filter(|token| token.is_active())
        .any(|token| constant_time_eq(presented_hash.as_bytes(), token.token_hash.as_bytes()));

    if !matched {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-api-key")
        && let Ok(s) = value.to_str()
    {
        let s = s.trim();
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }

    if let Some(value) = headers.get("x-goog-api-key")
        && let Ok(s) = value.to_str()
    {
        let s = s.trim();
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }

    if let Some(value) = headers.get(header::AUTHORIZATION)
        && let Ok(auth) = value.to_str()
    {
        let auth = auth.trim();
        let prefix = "Bearer ";
        if auth.len() > prefix.len() && auth[..prefix.len()].eq_ignore_ascii_case(prefix) {
            let token = auth[prefix.len()..].trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_token_reads_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header::HeaderValue::from_static("secret"));
        assert_eq!(extract_token(&headers), Some("secret".to_string()));
    }

    #[test]
    fn extract_token_reads_goog_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", header::HeaderValue::from_static("gkey"));
        assert_eq!(extract_token(&headers), Some("gkey".to_string()));
    }

    #[test]
    fn extract_token_reads_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, header::HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn extract_token_absent_is_none() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
