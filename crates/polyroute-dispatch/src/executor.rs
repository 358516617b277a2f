//! The Retry Executor (§4.3): drives one logical request through an
//! ordered candidate list, dispatching each attempt through the resolved
//! adapter, classifying failures, updating cooldowns, and recording the
//! whole lifecycle. Streaming bytes flow to the client as they arrive; a
//! failure after the first byte is terminal, never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;

use polyroute_adapter::failure::{classify, TransportErrorKind, UpstreamFailure};
use polyroute_adapter::types::{StreamEvent, UpstreamBody};
use polyroute_adapter::{AdapterError, UpstreamClient};
use polyroute_common::ClientType;
use polyroute_cooldown::CooldownRegistry;
use polyroute_model::cooldown::Cooldown;
use polyroute_model::{ErrorKind, ProxyRequestStatus, Usage};
use polyroute_pricing::PriceTable;
use polyroute_router::Router;

use crate::adapter_registry::AdapterRegistry;
use crate::backoff::backoff_duration;
use crate::recorder::Recorder;

/// The executor's view of the client connection: forward bytes downstream
/// and notice if the client goes away mid-stream.
#[async_trait]
pub trait ClientConnection: Send + Sync {
    /// Returns `false` once the client has disconnected; the executor
    /// treats that as `ClientCancelled`, never as an upstream fault.
    async fn send(&self, chunk: Bytes) -> bool;

    fn is_cancelled(&self) -> bool {
        false
    }
}

pub struct ExecuteRequest<'a> {
    pub client_type: ClientType,
    pub client_request: &'a Value,
    pub model_name: &'a str,
    pub session_id: Option<String>,
    pub project_id: i64,
    pub api_token_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOutcome {
    Completed,
    Failed { error_kind: ErrorKind },
    Cancelled,
}

pub struct RetryExecutor {
    router: Arc<Router>,
    cooldowns: Arc<CooldownRegistry>,
    recorder: Arc<Recorder>,
    prices: Arc<PriceTable>,
    adapters: Arc<AdapterRegistry>,
    upstream: Arc<dyn UpstreamClient>,
}

impl RetryExecutor {
    pub fn new(
        router: Arc<Router>,
        cooldowns: Arc<CooldownRegistry>,
        recorder: Arc<Recorder>,
        prices: Arc<PriceTable>,
        adapters: Arc<AdapterRegistry>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            router,
            cooldowns,
            recorder,
            prices,
            adapters,
            upstream,
        }
    }

    pub async fn execute(&self, request: ExecuteRequest<'_>, conn: &dyn ClientConnection) -> FinalOutcome {
        let now = OffsetDateTime::now_utc();
        let proxy_request = match self
            .recorder
            .start_request(
                request.client_type,
                request.model_name.to_string(),
                request.session_id.clone(),
                request.project_id,
                now,
            )
            .await
        {
            Ok(proxy_request) => proxy_request,
            Err(err) => {
                tracing::error!(?err, "failed to record proxy request");
                return FinalOutcome::Failed {
                    error_kind: ErrorKind::NoRoutesAvailable,
                };
            }
        };

        let now_ms = unix_millis(now);
        let candidates = match self
            .router
            .select(
                request.client_type,
                request.project_id,
                request.api_token_id,
                request.model_name,
                now_ms,
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(?err, "router selection failed");
                return self.finish_failed(proxy_request, ErrorKind::NoRoutesAvailable).await;
            }
        };
        if candidates.is_empty() {
            return self.finish_failed(proxy_request, ErrorKind::NoRoutesAvailable).await;
        }

        let proxy_request = match self.recorder.mark_in_progress(proxy_request).await {
            Ok(proxy_request) => proxy_request,
            Err(_) => proxy_request,
        };

        // maxAttempts governs the whole logical request, not one route; the
        // first selected candidate's retry config is the one in force.
        let max_attempts = candidates[0].retry_config.max_attempts.max(1) as usize;
        let mut last_error_kind = ErrorKind::AllRoutesFailed;

        for (sequence_no, candidate) in candidates.iter().take(max_attempts).enumerate() {
            if conn.is_cancelled() {
                return self.finish_cancelled(proxy_request).await;
            }
            if sequence_no > 0 {
                let delay = backoff_duration(candidate.retry_config.backoff_seed_ms, sequence_no as u32);
                tokio::time::sleep(delay).await;
            }

            let Some(adapter) = self.adapters.resolve(request.client_type, candidate.provider.provider_type) else {
                tracing::error!(
                    provider_id = candidate.provider.id,
                    client_type = request.client_type.as_str(),
                    "no adapter registered for this (client type, provider type) pair"
                );
                // unsupported_format is terminal, not per-route (§7): no
                // other candidate's wire shape can fix a request body this
                // adapter pairing can't translate.
                last_error_kind = ErrorKind::UnsupportedFormat;
                break;
            };

            let patched_request = patch_model(request.client_request, &candidate.mapped_model);
            let upstream_request = match adapter.translate_request(&patched_request) {
                Ok(upstream_request) => upstream_request,
                Err(err) => {
                    // format_conversion/unsupported_format are both terminal
                    // (§7), never retried against the next candidate.
                    last_error_kind = classify_adapter_request_error(&err);
                    break;
                }
            };
            let is_streaming = adapter.is_streaming(&patched_request);

            let attempt_started = OffsetDateTime::now_utc();
            let attempt = match self
                .recorder
                .start_attempt(
                    proxy_request.id,
                    candidate.provider.id,
                    candidate.route.id,
                    sequence_no as u32,
                    attempt_started,
                )
                .await
            {
                Ok(attempt) => attempt,
                Err(err) => {
                    tracing::error!(?err, "failed to record attempt start");
                    last_error_kind = ErrorKind::AllRoutesFailed;
                    continue;
                }
            };

            let first_byte_timeout = Duration::from_millis(candidate.retry_config.first_byte_timeout_ms);
            let dispatched = self.upstream.dispatch(upstream_request, first_byte_timeout).await;

            let response = match dispatched {
                Ok(response) => response,
                Err(failure) => {
                    let (kind, retryable) = self.handle_upstream_failure(
                        &candidate.provider,
                        request.client_type,
                        &failure,
                        now_ms,
                    );
                    let attempt_now = OffsetDateTime::now_utc();
                    let _ = self
                        .recorder
                        .fail_attempt(attempt, kind, failure_message(&failure), None, attempt_now)
                        .await;
                    last_error_kind = kind;
                    if !retryable {
                        break;
                    }
                    continue;
                }
            };

            if response.status >= 400 {
                let failure = UpstreamFailure::Http {
                    status: response.status,
                    headers: response.headers.clone(),
                    body: response_preview(&response.body),
                    rate_limit: None,
                };
                let (kind, retryable) = self.handle_upstream_failure(&candidate.provider, request.client_type, &failure, now_ms);
                let attempt_now = OffsetDateTime::now_utc();
                let _ = self
                    .recorder
                    .fail_attempt(attempt, kind, failure_message(&failure), Some(response.status), attempt_now)
                    .await;
                last_error_kind = kind;
                // 401/403 are terminal for this route but not for the whole
                // request (§7): still advance to the next candidate. Every
                // other non-retryable status breaks the loop immediately.
                let terminal_per_route = response.status == 401 || response.status == 403;
                if !retryable && !terminal_per_route {
                    break;
                }
                continue;
            }

            // Upstream accepted the request (response headers are non-error):
            // clear this provider's cooldown. A failure is only terminal for
            // the whole request once a byte has actually reached the client
            // (§4.3); run_once/run_stream track that and report a failure
            // before the first byte as retryable instead.
            self.cooldowns.clear_one(candidate.provider.id, Some(request.client_type));

            let outcome = if is_streaming {
                self.run_stream(&*adapter, response.body, candidate.retry_config.stream_idle_timeout_ms, conn)
                    .await
            } else {
                self.run_once(&*adapter, response.body, conn).await
            };

            match outcome {
                Ok(usage) => {
                    let cost = self.prices.calculate(&candidate.mapped_model, &usage);
                    let attempt_now = OffsetDateTime::now_utc();
                    let _ = self
                        .recorder
                        .complete_attempt(attempt, usage, cost, Some(response.status), attempt_now)
                        .await;
                    return self
                        .finish_completed(proxy_request, candidate.mapped_model.clone(), usage, cost, attempt_now)
                        .await;
                }
                Err(TerminalFailure::Cancelled) => {
                    let attempt_now = OffsetDateTime::now_utc();
                    let _ = self
                        .recorder
                        .fail_attempt(attempt, ErrorKind::ClientCancelled, "client disconnected".to_string(), None, attempt_now)
                        .await;
                    return self.finish_cancelled(proxy_request).await;
                }
                Err(TerminalFailure::Stream(kind)) => {
                    let attempt_now = OffsetDateTime::now_utc();
                    let _ = self
                        .recorder
                        .fail_attempt(attempt, kind, "mid-stream failure".to_string(), None, attempt_now)
                        .await;
                    return self.finish_failed(proxy_request, kind).await;
                }
                Err(TerminalFailure::Retryable(kind)) => {
                    // No byte ever reached the client (§7): this candidate
                    // failed before anything was committed downstream, so
                    // it's exactly like a dispatch-time failure and the
                    // loop advances to the next one instead of ending the
                    // request.
                    let attempt_now = OffsetDateTime::now_utc();
                    let _ = self
                        .recorder
                        .fail_attempt(attempt, kind, "stream ended before any byte reached the client".to_string(), None, attempt_now)
                        .await;
                    last_error_kind = kind;
                    continue;
                }
            }
        }

        self.finish_failed(proxy_request, last_error_kind).await
    }

    fn handle_upstream_failure(
        &self,
        provider: &polyroute_model::Provider,
        client_type: ClientType,
        failure: &UpstreamFailure,
        now_ms: i64,
    ) -> (ErrorKind, bool) {
        let incremental_count = self.cooldowns.incremental_count(provider.id, Some(client_type));
        let classification = classify(failure, now_ms, incremental_count);
        if let Some(directive) = classification.cooldown {
            self.cooldowns.set_if_later(Cooldown {
                provider_id: provider.id,
                client_type: directive.client_type,
                until_unix_ms: directive.until_unix_ms,
                cause: directive.cause,
                incremental_count: incremental_count + 1,
            });
        }
        (reclassify_timeout(failure, classification.error_kind), classification.retryable)
    }

    async fn run_once(
        &self,
        adapter: &dyn polyroute_adapter::Adapter,
        body: UpstreamBody,
        conn: &dyn ClientConnection,
    ) -> Result<Usage, TerminalFailure> {
        let bytes = match body {
            UpstreamBody::Bytes(bytes) => bytes,
            UpstreamBody::Stream(_) => {
                return Err(TerminalFailure::Stream(ErrorKind::FormatConversion));
            }
        };
        let parsed: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => return Err(TerminalFailure::Stream(ErrorKind::FormatConversion)),
        };
        let usage = polyroute_pricing::extract(&parsed).map(|reading| reading.usage).unwrap_or_default();
        let translated = match adapter.translate_response(&parsed) {
            Ok(translated) => translated,
            Err(_) => return Err(TerminalFailure::Stream(ErrorKind::FormatConversion)),
        };
        let out = serde_json::to_vec(&translated).unwrap_or_default();
        if !conn.send(Bytes::from(out)).await {
            return Err(TerminalFailure::Cancelled);
        }
        Ok(usage)
    }

    async fn run_stream(
        &self,
        adapter: &dyn polyroute_adapter::Adapter,
        body: UpstreamBody,
        stream_idle_timeout_ms: u64,
        conn: &dyn ClientConnection,
    ) -> Result<Usage, TerminalFailure> {
        let raw = match body {
            UpstreamBody::Stream(raw) => raw,
            UpstreamBody::Bytes(bytes) => {
                let (tx, rx) = tokio::sync::mpsc::channel(1);
                let _ = tx.try_send(bytes);
                rx
            }
        };
        let mut events = adapter.stream_transform(raw);
        let idle_timeout = Duration::from_millis(stream_idle_timeout_ms);
        let mut usage = Usage::default();
        let mut bytes_forwarded = false;

        loop {
            let next = tokio::time::timeout(idle_timeout, events.recv()).await;
            let event = match next {
                Ok(event) => event,
                Err(_) => return Err(terminal_or_retryable(bytes_forwarded, ErrorKind::StreamIdleTimeout)),
            };
            match event {
                None => return Ok(usage),
                Some(StreamEvent::Bytes(chunk)) => {
                    if !conn.send(chunk).await {
                        return Err(TerminalFailure::Cancelled);
                    }
                    bytes_forwarded = true;
                }
                Some(StreamEvent::Usage(reading)) => usage = reading,
                Some(StreamEvent::Error(kind)) => return Err(terminal_or_retryable(bytes_forwarded, kind)),
            }
        }
    }

    async fn finish_completed(
        &self,
        proxy_request: polyroute_model::ProxyRequest,
        response_model: String,
        usage: Usage,
        cost: i64,
        now: OffsetDateTime,
    ) -> FinalOutcome {
        let _ = self
            .recorder
            .finish_request(proxy_request, ProxyRequestStatus::Completed, Some(response_model), usage, cost, now)
            .await;
        FinalOutcome::Completed
    }

    async fn finish_failed(&self, proxy_request: polyroute_model::ProxyRequest, error_kind: ErrorKind) -> FinalOutcome {
        let now = OffsetDateTime::now_utc();
        let _ = self
            .recorder
            .finish_request(proxy_request, ProxyRequestStatus::Failed, None, Usage::default(), 0, now)
            .await;
        FinalOutcome::Failed { error_kind }
    }

    async fn finish_cancelled(&self, proxy_request: polyroute_model::ProxyRequest) -> FinalOutcome {
        let now = OffsetDateTime::now_utc();
        let _ = self
            .recorder
            .finish_request(proxy_request, ProxyRequestStatus::Cancelled, None, Usage::default(), 0, now)
            .await;
        FinalOutcome::Cancelled
    }
}

enum TerminalFailure {
    Cancelled,
    /// A failure after at least one byte already reached the client:
    /// terminal for the whole request, never retried (§4.3).
    Stream(ErrorKind),
    /// A failure before any byte reached the client: the candidate is
    /// abandoned like any other pre-stream failure and the loop moves on
    /// (§7's "retryable if no bytes forwarded yet").
    Retryable(ErrorKind),
}

/// `UpstreamClient::dispatch` enforces the first-byte timeout itself and
/// reports a breach as a plain transport timeout; the executor is the only
/// place that knows it happened before any byte arrived, so it re-tags the
/// generic classification into the distinct taxonomy kind (§7).
fn reclassify_timeout(failure: &UpstreamFailure, classified: ErrorKind) -> ErrorKind {
    match failure {
        UpstreamFailure::Transport {
            kind: TransportErrorKind::Timeout | TransportErrorKind::ReadTimeout,
            ..
        } => ErrorKind::FirstByteTimeout,
        _ => classified,
    }
}

/// A stream failure before any byte reached the client is just another
/// candidate failure; one after is terminal for the whole request (§7).
fn terminal_or_retryable(bytes_forwarded: bool, kind: ErrorKind) -> TerminalFailure {
    if bytes_forwarded {
        TerminalFailure::Stream(kind)
    } else {
        TerminalFailure::Retryable(kind)
    }
}

fn classify_adapter_request_error(err: &AdapterError) -> ErrorKind {
    match err {
        AdapterError::UnsupportedRequest => ErrorKind::UnsupportedFormat,
        AdapterError::FormatConversion(_) => ErrorKind::FormatConversion,
    }
}

fn failure_message(failure: &UpstreamFailure) -> String {
    match failure {
        UpstreamFailure::Transport { message, .. } => message.clone(),
        UpstreamFailure::Http { status, .. } => format!("upstream returned HTTP {status}"),
    }
}

fn response_preview(body: &UpstreamBody) -> Bytes {
    match body {
        UpstreamBody::Bytes(bytes) => bytes.clone(),
        UpstreamBody::Stream(_) => Bytes::new(),
    }
}

/// Best-effort, wire-format-agnostic substitution of the resolved model
/// name before handing the request to an adapter: sets a top-level
/// `model` field when present, leaving everything else untouched.
fn patch_model(client_request: &Value, mapped_model: &str) -> Value {
    let mut patched = client_request.clone();
    if let Some(object) = patched.as_object_mut()
        && object.contains_key("model")
    {
        object.insert("model".to_string(), Value::String(mapped_model.to_string()));
    }
    patched
}

fn unix_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_transport_failure_reclassifies_to_first_byte_timeout() {
        let failure = UpstreamFailure::Transport {
            kind: TransportErrorKind::Timeout,
            message: "timed out".to_string(),
        };
        assert_eq!(reclassify_timeout(&failure, ErrorKind::NetworkError), ErrorKind::FirstByteTimeout);
    }

    #[test]
    fn non_timeout_transport_failure_keeps_classification() {
        let failure = UpstreamFailure::Transport {
            kind: TransportErrorKind::Connect,
            message: "refused".to_string(),
        };
        assert_eq!(reclassify_timeout(&failure, ErrorKind::NetworkError), ErrorKind::NetworkError);
    }

    #[test]
    fn patch_model_sets_existing_model_field_only() {
        let request = serde_json::json!({"model": "old", "messages": []});
        let patched = patch_model(&request, "new");
        assert_eq!(patched["model"], "new");

        let request = serde_json::json!({"messages": []});
        let patched = patch_model(&request, "new");
        assert!(patched.get("model").is_none());
    }
}
