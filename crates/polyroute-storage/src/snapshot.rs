//! Read-through caches for the Router's hot path (§10.5): routes,
//! providers, strategies, retry configs and model mappings change rarely
//! but are read on every request, so each wrapper keeps an `ArcSwap`
//! snapshot refreshed from the real repository on writes and on a timer.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use polyroute_common::ClientType;
use polyroute_model::repo::{
    ModelMappingRepo, ProviderRepo, RepoResult, RetryConfigRepo, RouteRepo, RoutingStrategyRepo,
};
use polyroute_model::{ModelMapping, Provider, RetryConfig, Route, RoutingStrategy};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Wraps any `RouteRepo` with a periodically refreshed `list_all`/
/// `list_for_scope` cache; `get`/writes pass straight through, and a
/// successful write eagerly refreshes the cache so the next read isn't
/// stale for a whole interval.
pub struct CachedRouteRepo<R: RouteRepo> {
    inner: Arc<R>,
    cache: ArcSwap<Vec<Route>>,
}

impl<R: RouteRepo> CachedRouteRepo<R> {
    pub async fn new(inner: Arc<R>) -> RepoResult<Self> {
        let routes = inner.list_all().await?;
        Ok(Self {
            inner,
            cache: ArcSwap::from_pointee(routes),
        })
    }

    pub async fn refresh(&self) -> RepoResult<()> {
        let routes = self.inner.list_all().await?;
        self.cache.store(Arc::new(routes));
        Ok(())
    }

    pub async fn run_refresher(&self) {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(err) = self.refresh().await {
                tracing::warn!(?err, "route cache refresh failed");
            }
        }
    }
}

#[async_trait]
impl<R: RouteRepo> RouteRepo for CachedRouteRepo<R> {
    async fn get(&self, id: i64) -> RepoResult<Route> {
        self.inner.get(id).await
    }

    async fn list_for_scope(&self, project_id: i64, client_type: ClientType) -> RepoResult<Vec<Route>> {
        let routes = self.cache.load();
        Ok(routes
            .iter()
            .filter(|route| route.client_type == client_type && (route.project_id == project_id || route.project_id == 0))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> RepoResult<Vec<Route>> {
        Ok(self.cache.load().as_ref().clone())
    }

    async fn upsert(&self, route: Route) -> RepoResult<Route> {
        let saved = self.inner.upsert(route).await?;
        let _ = self.refresh().await;
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.inner.delete(id).await?;
        let _ = self.refresh().await;
        Ok(())
    }

    async fn renumber(&self, project_id: i64, client_type: ClientType, ordered_route_ids: Vec<i64>) -> RepoResult<()> {
        self.inner.renumber(project_id, client_type, ordered_route_ids).await?;
        let _ = self.refresh().await;
        Ok(())
    }
}

/// Same read-through shape as `CachedRouteRepo`, for providers.
pub struct CachedProviderRepo<R: ProviderRepo> {
    inner: Arc<R>,
    cache: ArcSwap<Vec<Provider>>,
}

impl<R: ProviderRepo> CachedProviderRepo<R> {
    pub async fn new(inner: Arc<R>) -> RepoResult<Self> {
        let providers = inner.list().await?;
        Ok(Self {
            inner,
            cache: ArcSwap::from_pointee(providers),
        })
    }

    pub async fn refresh(&self) -> RepoResult<()> {
        let providers = self.inner.list().await?;
        self.cache.store(Arc::new(providers));
        Ok(())
    }
}

#[async_trait]
impl<R: ProviderRepo> ProviderRepo for CachedProviderRepo<R> {
    async fn get(&self, id: i64) -> RepoResult<Provider> {
        if let Some(provider) = self.cache.load().iter().find(|provider| provider.id == id) {
            return Ok(provider.clone());
        }
        self.inner.get(id).await
    }

    async fn list(&self) -> RepoResult<Vec<Provider>> {
        Ok(self.cache.load().as_ref().clone())
    }

    async fn upsert(&self, provider: Provider) -> RepoResult<Provider> {
        let saved = self.inner.upsert(provider).await?;
        let _ = self.refresh().await;
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.inner.delete(id).await?;
        let _ = self.refresh().await;
        Ok(())
    }
}

/// Caches the single default plus the full list; per-project strategy
/// lookups still hit the repository, since strategies are read once per
/// request rather than once per candidate.
pub struct CachedRetryConfigRepo<R: RetryConfigRepo> {
    inner: Arc<R>,
    cache: ArcSwap<Vec<RetryConfig>>,
}

impl<R: RetryConfigRepo> CachedRetryConfigRepo<R> {
    pub async fn new(inner: Arc<R>) -> RepoResult<Self> {
        let configs = inner.list().await?;
        Ok(Self {
            inner,
            cache: ArcSwap::from_pointee(configs),
        })
    }

    pub async fn refresh(&self) -> RepoResult<()> {
        let configs = self.inner.list().await?;
        self.cache.store(Arc::new(configs));
        Ok(())
    }
}

#[async_trait]
impl<R: RetryConfigRepo> RetryConfigRepo for CachedRetryConfigRepo<R> {
    async fn get(&self, id: i64) -> RepoResult<RetryConfig> {
        if let Some(config) = self.cache.load().iter().find(|config| config.id == id) {
            return Ok(*config);
        }
        self.inner.get(id).await
    }

    async fn get_default(&self) -> RepoResult<RetryConfig> {
        if let Some(config) = self.cache.load().iter().find(|config| config.is_default) {
            return Ok(*config);
        }
        self.inner.get_default().await
    }

    async fn list(&self) -> RepoResult<Vec<RetryConfig>> {
        Ok(self.cache.load().as_ref().clone())
    }

    async fn upsert(&self, config: RetryConfig) -> RepoResult<RetryConfig> {
        let saved = self.inner.upsert(config).await?;
        let _ = self.refresh().await;
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.inner.delete(id).await?;
        let _ = self.refresh().await;
        Ok(())
    }
}

pub struct CachedModelMappingRepo<R: ModelMappingRepo> {
    inner: Arc<R>,
    cache: ArcSwap<Vec<ModelMapping>>,
}

impl<R: ModelMappingRepo> CachedModelMappingRepo<R> {
    pub async fn new(inner: Arc<R>) -> RepoResult<Self> {
        let mappings = inner.list().await?;
        Ok(Self {
            inner,
            cache: ArcSwap::from_pointee(mappings),
        })
    }

    pub async fn refresh(&self) -> RepoResult<()> {
        let mappings = self.inner.list().await?;
        self.cache.store(Arc::new(mappings));
        Ok(())
    }
}

#[async_trait]
impl<R: ModelMappingRepo> ModelMappingRepo for CachedModelMappingRepo<R> {
    async fn list(&self) -> RepoResult<Vec<ModelMapping>> {
        Ok(self.cache.load().as_ref().clone())
    }

    async fn upsert(&self, mapping: ModelMapping) -> RepoResult<ModelMapping> {
        let saved = self.inner.upsert(mapping).await?;
        let _ = self.refresh().await;
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.inner.delete(id).await?;
        let _ = self.refresh().await;
        Ok(())
    }
}

/// Strategies are keyed per project; cache the whole table and serve
/// lookups from memory, same refresh-on-write contract as the others.
pub struct CachedRoutingStrategyRepo<R: RoutingStrategyRepo> {
    inner: Arc<R>,
    cache: ArcSwap<Vec<RoutingStrategy>>,
}

impl<R: RoutingStrategyRepo> CachedRoutingStrategyRepo<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self {
            inner,
            cache: ArcSwap::from_pointee(Vec::new()),
        }
    }

    fn remember(&self, strategy: &RoutingStrategy) {
        let mut strategies = self.cache.load().as_ref().clone();
        strategies.retain(|existing| existing.project_id != strategy.project_id);
        strategies.push(strategy.clone());
        self.cache.store(Arc::new(strategies));
    }
}

#[async_trait]
impl<R: RoutingStrategyRepo> RoutingStrategyRepo for CachedRoutingStrategyRepo<R> {
    async fn get_for_project(&self, project_id: i64) -> RepoResult<RoutingStrategy> {
        if let Some(strategy) = self.cache.load().iter().find(|s| s.project_id == project_id) {
            return Ok(strategy.clone());
        }
        let strategy = self.inner.get_for_project(project_id).await?;
        self.remember(&strategy);
        Ok(strategy)
    }

    async fn upsert(&self, strategy: RoutingStrategy) -> RepoResult<RoutingStrategy> {
        let saved = self.inner.upsert(strategy).await?;
        self.remember(&saved);
        Ok(saved)
    }
}
