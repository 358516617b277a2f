//! Constant-time admin-token check (§10.6), mirroring the grounding
//! codebase's `x-admin-key` / bearer / query-param extraction.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use polyroute_common::constant_time_eq;

use crate::state::AdminState;

pub async fn require_admin_token(
    State(state): State<AdminState>,
    headers: HeaderMap,
    req: axum::extract::Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = extract_token(&headers, req.uri()).ok_or(StatusCode::UNAUTHORIZED)?;
    let expected_hash = state.global.load().admin_token_hash.clone();
    let presented_hash = blake3::hash(presented.as_bytes()).to_hex().to_string();
    if !constant_time_eq(presented_hash.as_bytes(), expected_hash.as_bytes()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

fn extract_token(headers: &HeaderMap, uri: &axum::http::Uri) -> Option<String> {
    if let Some(value) = headers.get("x-admin-key")
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

    let query = uri.query()?;
    let parsed: std::collections::HashMap<String, String> = serde_urlencoded::from_str(query).ok()?;
    let token = parsed.get("admin_key")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_token_prefers_header_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-key", header::HeaderValue::from_static("secret"));
        let uri: axum::http::Uri = "/admin/providers".parse().unwrap();
        assert_eq!(extract_token(&headers, &uri), Some("secret".to_string()));
    }

    #[test]
    fn extract_token_falls_back_to_query_param() {
        let headers = HeaderMap::new();
        let uri: axum::http::Uri = "/admin/providers?admin_key=fromquery".parse().unwrap();
        assert_eq!(extract_token(&headers, &uri), Some("fromquery".to_string()));
    }
}
