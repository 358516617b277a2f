//! Persistence interfaces for every entity in §3. Implementations live
//! outside this crate (out of scope, §1); this crate only defines the
//! contracts the core depends on.

use async_trait::async_trait;
use polyroute_common::ClientType;

use crate::{
    ApiToken, Cooldown, ModelMapping, Project, Provider, ProxyRequest, ProxyUpstreamAttempt,
    RetryConfig, Route, RoutingStrategy, Session, SystemSetting,
};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("backend error: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait ProviderRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Provider>;
    async fn list(&self) -> RepoResult<Vec<Provider>>;
    async fn upsert(&self, provider: Provider) -> RepoResult<Provider>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Project>;
    async fn get_by_slug(&self, slug: &str) -> RepoResult<Project>;
    async fn list(&self) -> RepoResult<Vec<Project>>;
    async fn upsert(&self, project: Project) -> RepoResult<Project>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait RouteRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Route>;
    /// All routes for (project_id OR global) x client_type, unordered.
    async fn list_for_scope(&self, project_id: i64, client_type: ClientType) -> RepoResult<Vec<Route>>;
    async fn list_all(&self) -> RepoResult<Vec<Route>>;
    async fn upsert(&self, route: Route) -> RepoResult<Route>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
    /// Transactional position remap within (project_id, client_type): the
    /// given routes (already carrying their desired final position) are
    /// written atomically (§9 redesign note on drag-reorder).
    async fn renumber(&self, project_id: i64, client_type: ClientType, ordered_route_ids: Vec<i64>) -> RepoResult<()>;
}

#[async_trait]
pub trait RoutingStrategyRepo: Send + Sync {
    async fn get_for_project(&self, project_id: i64) -> RepoResult<RoutingStrategy>;
    async fn upsert(&self, strategy: RoutingStrategy) -> RepoResult<RoutingStrategy>;
}

#[async_trait]
pub trait RetryConfigRepo: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<RetryConfig>;
    async fn get_default(&self) -> RepoResult<RetryConfig>;
    async fn list(&self) -> RepoResult<Vec<RetryConfig>>;
    async fn upsert(&self, config: RetryConfig) -> RepoResult<RetryConfig>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait CooldownRepo: Send + Sync {
    async fn get(&self, provider_id: i64, client_type: Option<ClientType>) -> RepoResult<Option<Cooldown>>;
    async fn list(&self) -> RepoResult<Vec<Cooldown>>;
    async fn upsert(&self, cooldown: Cooldown) -> RepoResult<()>;
    async fn clear(&self, provider_id: i64) -> RepoResult<()>;
    async fn delete_expired(&self, now_unix_ms: i64) -> RepoResult<u64>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn get(&self, session_id: &str) -> RepoResult<Option<Session>>;
    async fn upsert(&self, session: Session) -> RepoResult<Session>;
    async fn bind_project(&self, session_id: &str, project_id: i64) -> RepoResult<Session>;
    async fn reject(&self, session_id: &str, now: time::OffsetDateTime) -> RepoResult<Session>;
    async fn clear_rejection(&self, session_id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait ProxyRequestRepo: Send + Sync {
    async fn insert(&self, request: ProxyRequest) -> RepoResult<ProxyRequest>;
    async fn update(&self, request: ProxyRequest) -> RepoResult<ProxyRequest>;
    async fn get(&self, id: i64) -> RepoResult<ProxyRequest>;
    async fn list_recent(&self, limit: usize, offset: usize) -> RepoResult<Vec<ProxyRequest>>;
}

#[async_trait]
pub trait ProxyUpstreamAttemptRepo: Send + Sync {
    async fn insert(&self, attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt>;
    async fn update(&self, attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt>;
    async fn list_for_request(&self, proxy_request_id: i64) -> RepoResult<Vec<ProxyUpstreamAttempt>>;
    async fn list_recent(&self, limit: usize, offset: usize) -> RepoResult<Vec<ProxyUpstreamAttempt>>;
}

#[async_trait]
pub trait ModelMappingRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<ModelMapping>>;
    async fn upsert(&self, mapping: ModelMapping) -> RepoResult<ModelMapping>;
    async fn delete(&self, id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait SystemSettingRepo: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<SystemSetting>>;
    async fn list(&self) -> RepoResult<Vec<SystemSetting>>;
    async fn set(&self, key: &str, value: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait ApiTokenRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<ApiToken>>;
    async fn insert(&self, token: ApiToken) -> RepoResult<ApiToken>;
    async fn revoke(&self, id: i64, now: time::OffsetDateTime) -> RepoResult<()>;
}
