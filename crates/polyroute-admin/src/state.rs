use std::sync::Arc;

use arc_swap::ArcSwap;
use polyroute_common::GlobalConfig;
use polyroute_cooldown::CooldownRegistry;
use polyroute_events::EventHub;
use polyroute_model::repo::{
    ApiTokenRepo, ModelMappingRepo, ProjectRepo, ProviderRepo, ProxyRequestRepo,
    ProxyUpstreamAttemptRepo, RetryConfigRepo, RouteRepo, RoutingStrategyRepo, SystemSettingRepo,
};

/// Everything the thin CRUD router needs (§4.10): one repo trait object
/// per entity, the Cooldown Registry for snapshot/clear, the Event
/// Broadcaster for `/ws`, and the swappable global config for the
/// admin-token check.
#[derive(Clone)]
pub struct AdminState {
    pub global: Arc<ArcSwap<GlobalConfig>>,
    pub providers: Arc<dyn ProviderRepo>,
    pub projects: Arc<dyn ProjectRepo>,
    pub routes: Arc<dyn RouteRepo>,
    pub strategies: Arc<dyn RoutingStrategyRepo>,
    pub retry_configs: Arc<dyn RetryConfigRepo>,
    pub mappings: Arc<dyn ModelMappingRepo>,
    pub settings: Arc<dyn SystemSettingRepo>,
    pub api_tokens: Arc<dyn ApiTokenRepo>,
    pub requests: Arc<dyn ProxyRequestRepo>,
    pub attempts: Arc<dyn ProxyUpstreamAttemptRepo>,
    pub cooldowns: Arc<CooldownRegistry>,
    pub events: EventHub,
}
