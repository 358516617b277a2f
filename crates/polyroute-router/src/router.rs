//! Given a client request, produces an ordered candidate list of routes
//! honoring project overrides, active cooldowns, and the project's
//! routing strategy (§4.1).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use polyroute_common::ClientType;
use polyroute_cooldown::CooldownRegistry;
use polyroute_model::repo::{
    ModelMappingRepo, ProviderRepo, RepoError, RetryConfigRepo, RouteRepo, RoutingStrategyRepo,
};
use polyroute_model::{Provider, RetryConfig, Route, RoutingStrategyType, GLOBAL_PROJECT_ID};

use crate::model_mapper::resolve_model;
use crate::strategy::{round_robin_order, weighted_order};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
}

/// One candidate attempt the Retry Executor can try (§4.1).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub route: Route,
    pub provider: Provider,
    pub retry_config: RetryConfig,
    pub mapped_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CounterKey {
    project_id: i64,
    client_type: ClientType,
}

pub struct Router {
    routes: Arc<dyn RouteRepo>,
    providers: Arc<dyn ProviderRepo>,
    strategies: Arc<dyn RoutingStrategyRepo>,
    retry_configs: Arc<dyn RetryConfigRepo>,
    mappings: Arc<dyn ModelMappingRepo>,
    cooldowns: Arc<CooldownRegistry>,
    round_robin_counters: Mutex<HashMap<CounterKey, u64>>,
    weighted_seed: AtomicU64,
}

impl Router {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        routes: Arc<dyn RouteRepo>,
        providers: Arc<dyn ProviderRepo>,
        strategies: Arc<dyn RoutingStrategyRepo>,
        retry_configs: Arc<dyn RetryConfigRepo>,
        mappings: Arc<dyn ModelMappingRepo>,
        cooldowns: Arc<CooldownRegistry>,
    ) -> Self {
        Self {
            routes,
            providers,
            strategies,
            retry_configs,
            mappings,
            cooldowns,
            round_robin_counters: Mutex::new(HashMap::new()),
            weighted_seed: AtomicU64::new(1),
        }
    }

    /// Resolves the effective project: the session's bound project if set,
    /// else the request's project hint, else global (§4.1 step 1).
    pub fn resolve_project(session_project_id: Option<i64>, project_hint: Option<i64>) -> i64 {
        session_project_id.or(project_hint).unwrap_or(GLOBAL_PROJECT_ID)
    }

    pub async fn select(
        &self,
        client_type: ClientType,
        project_id: i64,
        api_token_id: Option<i64>,
        model_name: &str,
        now_unix_ms: i64,
    ) -> Result<Vec<Candidate>, RouterError> {
        let routes = self.routes.list_for_scope(project_id, client_type).await?;
        let ordered_routes = order_by_scope_and_position(routes, project_id);

        let mut candidates = Vec::new();
        for route in ordered_routes {
            if !route.enabled {
                continue;
            }
            let provider = match self.providers.get(route.provider_id).await {
                Ok(provider) => provider,
                Err(_) => continue,
            };
            if !provider.supports(client_type) {
                continue;
            }
            if self.cooldowns.is_cooling(provider.id, client_type, now_unix_ms) {
                continue;
            }
            candidates.push((route, provider));
        }

        let strategy = self.strategies.get_for_project(project_id).await.ok();
        let strategy_type = strategy
            .as_ref()
            .map(|strategy| strategy.strategy_type)
            .unwrap_or(RoutingStrategyType::Priority);

        let candidates = match strategy_type {
            RoutingStrategyType::Priority => candidates,
            RoutingStrategyType::RoundRobin => {
                let counter = self.next_round_robin_counter(project_id, client_type);
                round_robin_order(candidates, counter)
            }
            RoutingStrategyType::Weighted => {
                let strategy = strategy.expect("weighted strategy type implies a strategy row");
                let seed = self.weighted_seed.fetch_add(1, Ordering::Relaxed);
                weighted_order(candidates, |(_, provider)| strategy.weight_of(provider.id), seed)
            }
        };

        let mappings = self.mappings.list().await?;
        let mut result = Vec::with_capacity(candidates.len());
        for (route, provider) in candidates {
            let mapped_model = resolve_model(
                &mappings,
                client_type,
                Some(provider.id),
                project_id,
                api_token_id,
                model_name,
            );
            let retry_config = match route.retry_config_id {
                Some(id) => self.retry_configs.get(id).await?,
                None => self
                    .retry_configs
                    .get_default()
                    .await
                    .unwrap_or_else(|_| RetryConfig::fallback_default()),
            };
            result.push(Candidate {
                route,
                provider,
                retry_config,
                mapped_model,
            });
        }
        Ok(result)
    }

    fn next_round_robin_counter(&self, project_id: i64, client_type: ClientType) -> u64 {
        let mut counters = self.round_robin_counters.lock().expect("round robin counters poisoned");
        let key = CounterKey { project_id, client_type };
        let counter = counters.entry(key).or_insert(0);
        let value = *counter;
        *counter = counter.wrapping_add(1);
        value
    }
}

/// Project-specific routes sort before global routes; within each group,
/// ascending `position` (§4.1 step 2).
fn order_by_scope_and_position(routes: Vec<Route>, project_id: i64) -> Vec<Route> {
    let (mut project_specific, mut global): (Vec<Route>, Vec<Route>) = routes
        .into_iter()
        .partition(|route| project_id != GLOBAL_PROJECT_ID && route.project_id == project_id);
    project_specific.sort_by_key(|route| route.position);
    global.sort_by_key(|route| route.position);
    project_specific.extend(global);
    project_specific
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: i64, project_id: i64, position: i32) -> Route {
        Route {
            id,
            project_id,
            client_type: ClientType::Claude,
            provider_id: id,
            position,
            enabled: true,
            is_native: true,
            retry_config_id: None,
        }
    }

    #[test]
    fn project_specific_routes_sort_before_global() {
        let routes = vec![route(1, 0, 1), route(2, 7, 5), route(3, 7, 1), route(4, 0, 0)];
        let ordered = order_by_scope_and_position(routes, 7);
        let ids: Vec<i64> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn global_project_keeps_single_position_order() {
        let routes = vec![route(1, 0, 2), route(2, 0, 1)];
        let ordered = order_by_scope_and_position(routes, GLOBAL_PROJECT_ID);
        let ids: Vec<i64> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn resolve_project_prefers_session_binding() {
        assert_eq!(Router::resolve_project(Some(3), Some(9)), 3);
        assert_eq!(Router::resolve_project(None, Some(9)), 9);
        assert_eq!(Router::resolve_project(None, None), GLOBAL_PROJECT_ID);
    }
}
