//! The five client-facing inference endpoints (§6): parse the wire body
//! just enough to find the model name and the streaming flag, thread the
//! session/project-binding dance through the Session Waiter, then hand the
//! request to the Retry Executor over the axum bridge in `connection`.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio_stream::wrappers::ReceiverStream;

use polyroute_common::{ClientType, GlobalConfig};
use polyroute_dispatch::{ExecuteRequest, FinalOutcome, RetryExecutor, SessionWaiter, WaitOutcome};
use polyroute_model::repo::SessionRepo;
use polyroute_model::{ErrorKind, Session};
use polyroute_router::Router as DispatchRouter;

use crate::connection::ChannelConnection;

const RESPONSE_CHANNEL_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct ProxyState {
    pub global: Arc<ArcSwap<GlobalConfig>>,
    pub executor: Arc<RetryExecutor>,
    pub session_waiter: Arc<SessionWaiter>,
    pub sessions: Arc<dyn SessionRepo>,
}

pub fn proxy_router(state: ProxyState) -> Router {
    Router::new()
        .route("/v1/messages", post(claude_messages))
        .route("/v1/chat/completions", post(openai_chat_completions))
        .route("/v1/responses", post(openai_responses))
        .route("/v1beta/models/{model_and_action}", post(gemini_generate_content))
        .with_state(state)
}

async fn claude_messages(State(state): State<ProxyState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let model_name = model_from_body(&body);
    dispatch(state, ClientType::Claude, headers, body, model_name).await
}

async fn openai_chat_completions(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model_name = model_from_body(&body);
    dispatch(state, ClientType::Openai, headers, body, model_name).await
}

/// `/v1/responses` is shared by the OpenAI Responses API and Codex; an
/// explicit `x-client-type: codex` header disambiguates, defaulting to
/// plain OpenAI when absent.
async fn openai_responses(State(state): State<ProxyState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let client_type = match headers.get("x-client-type").and_then(|value| value.to_str().ok()) {
        Some(value) if value.eq_ignore_ascii_case("codex") => ClientType::Codex,
        _ => ClientType::Openai,
    };
    let model_name = model_from_body(&body);
    dispatch(state, client_type, headers, body, model_name).await
}

async fn gemini_generate_content(
    State(state): State<ProxyState>,
    Path(model_and_action): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let Some((model_name, action)) = model_and_action.rsplit_once(':') else {
        return error_response(StatusCode::BAD_REQUEST, "expected {model}:action in path");
    };
    let is_streaming = match action {
        "generateContent" => false,
        "streamGenerateContent" => true,
        _ => return error_response(StatusCode::NOT_FOUND, "unknown Gemini action"),
    };
    if let Some(object) = body.as_object_mut() {
        object.insert("stream".to_string(), Value::Bool(is_streaming));
    }
    dispatch(state, ClientType::Gemini, headers, body, model_name.to_string()).await
}

fn model_from_body(body: &Value) -> String {
    body.get("model").and_then(Value::as_str).unwrap_or_default().to_string()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

async fn dispatch(
    state: ProxyState,
    client_type: ClientType,
    headers: HeaderMap,
    body: Value,
    model_name: String,
) -> Response {
    let session_id = header_value(&headers, "x-session-id");
    let project_hint = header_value(&headers, "x-project-id").and_then(|value| value.parse::<i64>().ok());

    let project_id = match resolve_project_id(&state, client_type, session_id.as_deref(), project_hint).await {
        Ok(project_id) => project_id,
        Err(response) => return response,
    };

    let (conn, mut rx) = ChannelConnection::new(RESPONSE_CHANNEL_CAPACITY);
    let executor = state.executor.clone();
    let session_for_task = session_id.clone();
    let handle: tokio::task::JoinHandle<FinalOutcome> = tokio::spawn(async move {
        let request = ExecuteRequest {
            client_type,
            client_request: &body,
            model_name: &model_name,
            session_id: session_for_task,
            project_id,
            api_token_id: None,
        };
        executor.execute(request, &conn).await
    });

    match rx.recv().await {
        Some(first_chunk) => {
            let content_type = if client_type == ClientType::Gemini || first_chunk.starts_with(b"data:") {
                "text/event-stream"
            } else {
                "application/json"
            };
            let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(first_chunk) })
                .chain(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from_stream(stream))
                .expect("static response parts are always valid")
        }
        None => {
            let outcome = handle.await.unwrap_or(FinalOutcome::Failed {
                error_kind: ErrorKind::AllRoutesFailed,
            });
            match outcome {
                FinalOutcome::Completed => StatusCode::OK.into_response(),
                FinalOutcome::Cancelled => error_response(StatusCode::from_u16(ErrorKind::ClientCancelled.http_status()).unwrap(), "client disconnected"),
                FinalOutcome::Failed { error_kind } => {
                    let status = StatusCode::from_u16(error_kind.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
                    error_response(status, error_kind_message(error_kind))
                }
            }
        }
    }
}

async fn resolve_project_id(
    state: &ProxyState,
    client_type: ClientType,
    session_id: Option<&str>,
    project_hint: Option<i64>,
) -> Result<i64, Response> {
    let Some(session_id) = session_id else {
        return Ok(DispatchRouter::resolve_project(None, project_hint));
    };

    let now = OffsetDateTime::now_utc();
    let session = match state.sessions.get(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => match state.sessions.upsert(Session::new(session_id.to_string(), client_type, now)).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(?err, "failed to create session");
                return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to record session"));
            }
        },
        Err(err) => {
            tracing::error!(?err, "failed to load session");
            return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to load session"));
        }
    };

    let snapshot = state.global.load();
    if !snapshot.force_project_binding || session.is_bound() {
        return Ok(DispatchRouter::resolve_project(session.project_id, project_hint));
    }
    let timeout = Duration::from_secs(snapshot.force_project_timeout_secs as u64);
    drop(snapshot);

    match state.session_waiter.wait(session_id, client_type, timeout).await {
        WaitOutcome::Bound(bound_project_id) => Ok(DispatchRouter::resolve_project(Some(bound_project_id), project_hint)),
        WaitOutcome::Rejected => Err(error_response(StatusCode::FORBIDDEN, "session rejected by operator")),
        WaitOutcome::Timeout => Err(error_response(StatusCode::GATEWAY_TIMEOUT, "timed out waiting for project binding")),
    }
}

fn error_kind_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidInput => "invalid input",
        ErrorKind::NotFound => "not found",
        ErrorKind::AlreadyExists => "already exists",
        ErrorKind::FirstByteTimeout => "upstream first-byte timeout",
        ErrorKind::StreamIdleTimeout => "upstream stream idle timeout",
        ErrorKind::UpstreamHttpError => "upstream returned an error",
        ErrorKind::NetworkError => "upstream network error",
        ErrorKind::FormatConversion => "could not convert upstream response",
        ErrorKind::UnsupportedFormat => "no adapter for this client/provider pair",
        ErrorKind::ClientCancelled => "client disconnected",
        ErrorKind::AllRoutesFailed => "all routes failed",
        ErrorKind::NoRoutesAvailable => "no routes available",
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
