//! End-to-end coverage of the boundary scenarios that motivate the Retry
//! Executor's design: cooldown filtering, first-byte-timeout retry, a
//! `Retry-After`-driven cooldown, and a terminal mid-stream failure. No
//! network access: the only faked seam is `UpstreamClient`, everything
//! else (`Router`, `CooldownRegistry`, `Recorder`, `AdapterRegistry`,
//! `RetryExecutor`) is the real thing running against in-memory repos.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tokio::sync::mpsc;

use polyroute_adapter::failure::{TransportErrorKind, UpstreamFailure};
use polyroute_adapter::reference::PassthroughAdapter;
use polyroute_adapter::types::{EventStream, HttpMethod, RawByteStream, StreamEvent, UpstreamBody, UpstreamHttpRequest, UpstreamHttpResponse};
use polyroute_adapter::{Adapter, AdapterError, UpstreamClient};
use polyroute_common::ClientType;
use polyroute_cooldown::CooldownRegistry;
use polyroute_dispatch::{AdapterRegistry, ClientConnection, ExecuteRequest, FinalOutcome, Recorder, RetryExecutor};
use polyroute_events::EventHub;
use polyroute_model::repo::{
    ModelMappingRepo, ProviderRepo, ProxyRequestRepo, ProxyUpstreamAttemptRepo, RepoError, RepoResult,
    RetryConfigRepo, RouteRepo, RoutingStrategyRepo,
};
use polyroute_model::{ModelMapping, Provider, ProxyRequest, ProxyUpstreamAttempt, RetryConfig, Route, RoutingStrategy, GLOBAL_PROJECT_ID};
use polyroute_router::Router;

fn provider(id: i64, client_types: &[ClientType]) -> Provider {
    Provider {
        id,
        name: format!("provider-{id}"),
        provider_type: polyroute_model::provider::ProviderType::Custom,
        config: json!({}),
        supported_client_types: client_types.iter().copied().collect::<BTreeSet<_>>(),
    }
}

fn route(id: i64, provider_id: i64, position: i32) -> Route {
    Route {
        id,
        project_id: GLOBAL_PROJECT_ID,
        client_type: ClientType::Claude,
        provider_id,
        position,
        enabled: true,
        is_native: true,
        retry_config_id: None,
    }
}

fn fast_retry_config() -> RetryConfig {
    RetryConfig {
        id: 1,
        is_default: true,
        max_attempts: 3,
        first_byte_timeout_ms: 50,
        stream_idle_timeout_ms: 5_000,
        backoff_seed_ms: 1,
    }
}

/// Every repo needed by `Router`/`Recorder`, backed by `Mutex<HashMap<...>>`
/// or a plain `Vec`. No behavior beyond what the traits require.
struct FakeProviders(Mutex<HashMap<i64, Provider>>);
#[async_trait]
impl ProviderRepo for FakeProviders {
    async fn get(&self, id: i64) -> RepoResult<Provider> {
        self.0.lock().unwrap().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list(&self) -> RepoResult<Vec<Provider>> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }
    async fn upsert(&self, provider: Provider) -> RepoResult<Provider> {
        self.0.lock().unwrap().insert(provider.id, provider.clone());
        Ok(provider)
    }
    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.0.lock().unwrap().remove(&id);
        Ok(())
    }
}

struct FakeRoutes(Mutex<Vec<Route>>);
#[async_trait]
impl RouteRepo for FakeRoutes {
    async fn get(&self, id: i64) -> RepoResult<Route> {
        self.0.lock().unwrap().iter().find(|r| r.id == id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list_for_scope(&self, _project_id: i64, client_type: ClientType) -> RepoResult<Vec<Route>> {
        Ok(self.0.lock().unwrap().iter().filter(|r| r.client_type == client_type).cloned().collect())
    }
    async fn list_all(&self) -> RepoResult<Vec<Route>> {
        Ok(self.0.lock().unwrap().clone())
    }
    async fn upsert(&self, route: Route) -> RepoResult<Route> {
        self.0.lock().unwrap().push(route.clone());
        Ok(route)
    }
    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.0.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
    async fn renumber(&self, _project_id: i64, _client_type: ClientType, _ordered_route_ids: Vec<i64>) -> RepoResult<()> {
        Ok(())
    }
}

struct FakeStrategies;
#[async_trait]
impl RoutingStrategyRepo for FakeStrategies {
    async fn get_for_project(&self, _project_id: i64) -> RepoResult<RoutingStrategy> {
        Err(RepoError::NotFound)
    }
    async fn upsert(&self, strategy: RoutingStrategy) -> RepoResult<RoutingStrategy> {
        Ok(strategy)
    }
}

struct FakeRetryConfigs(RetryConfig);
#[async_trait]
impl RetryConfigRepo for FakeRetryConfigs {
    async fn get(&self, _id: i64) -> RepoResult<RetryConfig> {
        Ok(self.0)
    }
    async fn get_default(&self) -> RepoResult<RetryConfig> {
        Ok(self.0)
    }
    async fn list(&self) -> RepoResult<Vec<RetryConfig>> {
        Ok(vec![self.0])
    }
    async fn upsert(&self, config: RetryConfig) -> RepoResult<RetryConfig> {
        Ok(config)
    }
    async fn delete(&self, _id: i64) -> RepoResult<()> {
        Ok(())
    }
}

struct FakeMappings;
#[async_trait]
impl ModelMappingRepo for FakeMappings {
    async fn list(&self) -> RepoResult<Vec<ModelMapping>> {
        Ok(Vec::new())
    }
    async fn upsert(&self, mapping: ModelMapping) -> RepoResult<ModelMapping> {
        Ok(mapping)
    }
    async fn delete(&self, _id: i64) -> RepoResult<()> {
        Ok(())
    }
}

struct FakeProxyRequests {
    next_id: AtomicI64,
    rows: Mutex<HashMap<i64, ProxyRequest>>,
}
impl FakeProxyRequests {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            rows: Mutex::new(HashMap::new()),
        }
    }
}
#[async_trait]
impl ProxyRequestRepo for FakeProxyRequests {
    async fn insert(&self, mut request: ProxyRequest) -> RepoResult<ProxyRequest> {
        request.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.lock().unwrap().insert(request.id, request.clone());
        Ok(request)
    }
    async fn update(&self, request: ProxyRequest) -> RepoResult<ProxyRequest> {
        self.rows.lock().unwrap().insert(request.id, request.clone());
        Ok(request)
    }
    async fn get(&self, id: i64) -> RepoResult<ProxyRequest> {
        self.rows.lock().unwrap().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list_recent(&self, _limit: usize, _offset: usize) -> RepoResult<Vec<ProxyRequest>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}

struct FakeAttempts {
    next_id: AtomicI64,
    rows: Mutex<HashMap<i64, ProxyUpstreamAttempt>>,
}
impl FakeAttempts {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            rows: Mutex::new(HashMap::new()),
        }
    }
    fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
    fn all(&self) -> Vec<ProxyUpstreamAttempt> {
        let rows = self.rows.lock().unwrap();
        let mut items: Vec<_> = rows.values().cloned().collect();
        items.sort_by_key(|a| a.sequence_no);
        items
    }
}
#[async_trait]
impl ProxyUpstreamAttemptRepo for FakeAttempts {
    async fn insert(&self, mut attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt> {
        attempt.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.lock().unwrap().insert(attempt.id, attempt.clone());
        Ok(attempt)
    }
    async fn update(&self, attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt> {
        self.rows.lock().unwrap().insert(attempt.id, attempt.clone());
        Ok(attempt)
    }
    async fn list_for_request(&self, proxy_request_id: i64) -> RepoResult<Vec<ProxyUpstreamAttempt>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.proxy_request_id == proxy_request_id)
            .cloned()
            .collect())
    }
    async fn list_recent(&self, _limit: usize, _offset: usize) -> RepoResult<Vec<ProxyUpstreamAttempt>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}

/// Collects every chunk sent to the simulated client; never cancels.
#[derive(Default)]
struct RecordingConnection {
    chunks: Mutex<Vec<Bytes>>,
}
#[async_trait]
impl ClientConnection for RecordingConnection {
    async fn send(&self, chunk: Bytes) -> bool {
        self.chunks.lock().unwrap().push(chunk);
        true
    }
}

/// Scripts one `UpstreamHttpResponse`/`UpstreamFailure` per call, indexed
/// by call order, keyed on the provider a request's URL encodes (the
/// passthrough adapter's base URL doubles as the provider id here).
struct ScriptedUpstream {
    calls: AtomicU32,
    steps: Vec<Box<dyn Fn() -> Result<UpstreamHttpResponse, UpstreamFailure> + Send + Sync>>,
}
impl ScriptedUpstream {
    fn new(steps: Vec<Box<dyn Fn() -> Result<UpstreamHttpResponse, UpstreamFailure> + Send + Sync>>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            steps,
        }
    }
    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}
#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn dispatch(&self, _request: UpstreamHttpRequest, _first_byte_timeout: Duration) -> Result<UpstreamHttpResponse, UpstreamFailure> {
        let index = self.calls.fetch_add(1, Ordering::Relaxed) as usize;
        self.steps[index]()
    }
}

fn ok_json_response(body: Value) -> UpstreamHttpResponse {
    UpstreamHttpResponse {
        status: 200,
        headers: Vec::new(),
        body: UpstreamBody::Bytes(Bytes::from(serde_json::to_vec(&body).unwrap())),
    }
}

struct Harness {
    executor: RetryExecutor,
    attempts: Arc<FakeAttempts>,
    cooldowns: Arc<CooldownRegistry>,
}

fn build_harness(providers: Vec<Provider>, routes: Vec<Route>, upstream: Arc<dyn UpstreamClient>) -> Harness {
    let events = EventHub::new();
    let (cooldowns, _write_through_rx) = CooldownRegistry::new(events.clone());
    let cooldowns = Arc::new(cooldowns);

    let mut provider_map = HashMap::new();
    for p in providers {
        provider_map.insert(p.id, p);
    }
    let router = Arc::new(Router::new(
        Arc::new(FakeRoutes(Mutex::new(routes))),
        Arc::new(FakeProviders(Mutex::new(provider_map))),
        Arc::new(FakeStrategies),
        Arc::new(FakeRetryConfigs(fast_retry_config())),
        Arc::new(FakeMappings),
        cooldowns.clone(),
    ));

    let attempts = Arc::new(FakeAttempts::new());
    let recorder = Arc::new(Recorder::new(Arc::new(FakeProxyRequests::new()), attempts.clone(), events));

    let mut registry = AdapterRegistry::new();
    for client_type in [ClientType::Claude] {
        registry.register(
            client_type,
            polyroute_model::provider::ProviderType::Custom,
            Arc::new(PassthroughAdapter::new(client_type, "http://upstream".to_string())),
        );
    }

    let executor = RetryExecutor::new(
        router,
        cooldowns.clone(),
        recorder,
        Arc::new(polyroute_pricing::PriceTable::new()),
        Arc::new(registry),
        upstream,
    );

    Harness {
        executor,
        attempts,
        cooldowns,
    }
}

fn execute_request<'a>(harness: &'a Harness, conn: &'a dyn ClientConnection) -> impl std::future::Future<Output = FinalOutcome> + 'a {
    let body = json!({"model": "claude-3", "stream": false, "messages": []});
    async move {
        harness
            .executor
            .execute(
                ExecuteRequest {
                    client_type: ClientType::Claude,
                    client_request: &body,
                    model_name: "claude-3",
                    session_id: None,
                    project_id: GLOBAL_PROJECT_ID,
                    api_token_id: None,
                },
                conn,
            )
            .await
    }
}

/// Scenario 1: two providers, one already cooled down. The router only
/// offers the non-cooled provider, and the very first attempt succeeds.
#[tokio::test]
async fn cooled_down_provider_is_skipped_and_first_live_attempt_succeeds() {
    let providers = vec![provider(1, &[ClientType::Claude]), provider(2, &[ClientType::Claude])];
    let routes = vec![route(1, 1, 0), route(2, 2, 1)];
    let upstream: Arc<dyn UpstreamClient> = Arc::new(ScriptedUpstream::new(vec![Box::new(|| {
        Ok(ok_json_response(json!({"usage": {"input_tokens": 10, "output_tokens": 5}})))
    })]));
    let harness = build_harness(providers, routes, upstream);

    harness.cooldowns.set_if_later(polyroute_model::cooldown::Cooldown {
        provider_id: 1,
        client_type: None,
        until_unix_ms: i64::MAX / 2,
        cause: polyroute_model::cooldown::CooldownCause::ServerError,
        incremental_count: 1,
    });

    let conn = RecordingConnection::default();
    let outcome = execute_request(&harness, &conn).await;

    assert_eq!(outcome, FinalOutcome::Completed);
    assert_eq!(harness.attempts.count(), 1);
    let attempts = harness.attempts.all();
    assert_eq!(attempts[0].provider_id, 2);
    assert_eq!(attempts[0].status, polyroute_model::AttemptStatus::Completed);
}

/// Scenario 2: the first candidate never answers within its first-byte
/// timeout; the executor retries against the second candidate, which
/// succeeds, and the first attempt is recorded as a first-byte timeout.
#[tokio::test]
async fn first_byte_timeout_triggers_retry_against_next_candidate() {
    let providers = vec![provider(1, &[ClientType::Claude]), provider(2, &[ClientType::Claude])];
    let routes = vec![route(1, 1, 0), route(2, 2, 1)];
    let upstream: Arc<dyn UpstreamClient> = Arc::new(ScriptedUpstream::new(vec![
        Box::new(|| {
            Err(UpstreamFailure::Transport {
                kind: TransportErrorKind::Timeout,
                message: "first byte not received in time".to_string(),
            })
        }),
        Box::new(|| Ok(ok_json_response(json!({"usage": {"input_tokens": 3, "output_tokens": 2}})))),
    ]));
    let harness = build_harness(providers, routes, upstream);

    let conn = RecordingConnection::default();
    let outcome = execute_request(&harness, &conn).await;

    assert_eq!(outcome, FinalOutcome::Completed);
    let attempts = harness.attempts.all();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].provider_id, 1);
    assert_eq!(attempts[0].status, polyroute_model::AttemptStatus::Failed);
    assert_eq!(attempts[0].error_kind, Some(polyroute_model::ErrorKind::FirstByteTimeout));
    assert_eq!(attempts[1].provider_id, 2);
    assert_eq!(attempts[1].status, polyroute_model::AttemptStatus::Completed);

    // A network-class transport failure cools the failing provider down
    // for every client type, independent of the retry outcome.
    assert!(harness.cooldowns.is_cooling(1, ClientType::Claude, 0));
}

/// Scenario 3: a 429 carrying `Retry-After: 30` sets the failing
/// provider's cooldown 30s out and the request falls through to the
/// second candidate.
#[tokio::test]
async fn retry_after_header_drives_cooldown_and_falls_through() {
    let providers = vec![provider(1, &[ClientType::Claude]), provider(2, &[ClientType::Claude])];
    let routes = vec![route(1, 1, 0), route(2, 2, 1)];
    let upstream: Arc<dyn UpstreamClient> = Arc::new(ScriptedUpstream::new(vec![
        Box::new(|| {
            Ok(UpstreamHttpResponse {
                status: 429,
                headers: vec![("retry-after".to_string(), "30".to_string())],
                body: UpstreamBody::Bytes(Bytes::new()),
            })
        }),
        Box::new(|| Ok(ok_json_response(json!({"usage": {"input_tokens": 1, "output_tokens": 1}})))),
    ]));
    let harness = build_harness(providers, routes, upstream);

    let before_ms = unix_millis_now();
    let conn = RecordingConnection::default();
    let outcome = execute_request(&harness, &conn).await;
    let after_ms = unix_millis_now();

    assert_eq!(outcome, FinalOutcome::Completed);
    let attempts = harness.attempts.all();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].error_kind, Some(polyroute_model::ErrorKind::UpstreamHttpError));
    assert_eq!(attempts[0].http_status, Some(429));

    let cooldown = harness.cooldowns.get(1, None, 0).expect("429 sets a cooldown");
    assert!(cooldown.until_unix_ms >= before_ms + 30_000 && cooldown.until_unix_ms <= after_ms + 30_000);
    assert_eq!(cooldown.cause, polyroute_model::cooldown::CooldownCause::RetryAfterHeader);
}

fn unix_millis_now() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// A minimal streaming adapter that forwards two chunks and then emits a
/// terminal `StreamEvent::Error`, simulating an upstream connection reset
/// a real vendor adapter would detect mid-frame.
struct ResetMidStreamAdapter;
#[async_trait::async_trait]
impl Adapter for ResetMidStreamAdapter {
    fn name(&self) -> &'static str {
        "test.reset_mid_stream"
    }
    fn is_streaming(&self, _client_request: &Value) -> bool {
        true
    }
    fn translate_request(&self, client_request: &Value) -> Result<UpstreamHttpRequest, AdapterError> {
        Ok(UpstreamHttpRequest {
            method: HttpMethod::Post,
            url: "http://upstream/v1/messages".to_string(),
            headers: Vec::new(),
            body: Some(Bytes::from(serde_json::to_vec(client_request).unwrap())),
            is_stream: true,
        })
    }
    fn translate_response(&self, upstream_response: &Value) -> Result<Value, AdapterError> {
        Ok(upstream_response.clone())
    }
    fn stream_transform(&self, mut upstream: RawByteStream) -> EventStream {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            while upstream.recv().await.is_some() {
                if tx.send(StreamEvent::Bytes(Bytes::from_static(b"partial"))).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Error(polyroute_model::ErrorKind::UpstreamHttpError)).await;
        });
        rx
    }
}

struct SingleStepUpstream;
#[async_trait]
impl UpstreamClient for SingleStepUpstream {
    async fn dispatch(&self, _request: UpstreamHttpRequest, _first_byte_timeout: Duration) -> Result<UpstreamHttpResponse, UpstreamFailure> {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let _ = tx.send(Bytes::from_static(b"chunk-one")).await;
            let _ = tx.send(Bytes::from_static(b"chunk-two")).await;
        });
        Ok(UpstreamHttpResponse {
            status: 200,
            headers: Vec::new(),
            body: UpstreamBody::Stream(rx),
        })
    }
}

/// Scenario 4: once bytes have reached the client, a mid-stream failure is
/// terminal. The executor does not retry a second candidate even though
/// one is available; the request ends FAILED with exactly one attempt.
#[tokio::test]
async fn mid_stream_failure_after_first_byte_is_terminal() {
    let providers = vec![provider(1, &[ClientType::Claude]), provider(2, &[ClientType::Claude])];
    let routes = vec![route(1, 1, 0), route(2, 2, 1)];

    let events = EventHub::new();
    let (cooldowns, _write_through_rx) = CooldownRegistry::new(events.clone());
    let cooldowns = Arc::new(cooldowns);
    let router = Arc::new(Router::new(
        Arc::new(FakeRoutes(Mutex::new(routes))),
        Arc::new(FakeProviders(Mutex::new(
            providers.into_iter().map(|p| (p.id, p)).collect(),
        ))),
        Arc::new(FakeStrategies),
        Arc::new(FakeRetryConfigs(fast_retry_config())),
        Arc::new(FakeMappings),
        cooldowns.clone(),
    ));
    let attempts = Arc::new(FakeAttempts::new());
    let recorder = Arc::new(Recorder::new(Arc::new(FakeProxyRequests::new()), attempts.clone(), events));
    let mut registry = AdapterRegistry::new();
    registry.register(ClientType::Claude, polyroute_model::provider::ProviderType::Custom, Arc::new(ResetMidStreamAdapter));
    let executor = RetryExecutor::new(
        router,
        cooldowns.clone(),
        recorder,
        Arc::new(polyroute_pricing::PriceTable::new()),
        Arc::new(registry),
        Arc::new(SingleStepUpstream),
    );
    let harness = Harness {
        executor,
        attempts,
        cooldowns,
    };

    let conn = RecordingConnection::default();
    let outcome = execute_request(&harness, &conn).await;

    assert_eq!(
        outcome,
        FinalOutcome::Failed {
            error_kind: polyroute_model::ErrorKind::UpstreamHttpError
        }
    );
    assert_eq!(harness.attempts.count(), 1, "a post-first-byte failure must not spawn a retry attempt");
    assert_eq!(conn.chunks.lock().unwrap().len(), 2, "bytes already forwarded to the client are not retracted");
}
