//! CLI/ENV/DB config merge, repository wiring, and in-memory state
//! construction (§4.11). Mirrors the grounding codebase's bootstrap shape:
//! connect storage, merge config, persist it back, then build every
//! in-process component the server needs.

use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwap;

use polyroute_admin::AdminState;
use polyroute_common::{ClientType, GlobalConfig, GlobalConfigPatch};
use polyroute_cooldown::CooldownRegistry;
use polyroute_dispatch::{AdapterRegistry, RetryExecutor, SessionWaiter, UpstreamClientConfig, WreqUpstreamClient};
use polyroute_events::EventHub;
use polyroute_model::provider::ProviderType;
use polyroute_model::repo::{ProviderRepo, SystemSettingRepo};
use polyroute_pricing::PriceTable;
use polyroute_router::Router;
use polyroute_storage::{
    CachedModelMappingRepo, CachedProviderRepo, CachedRetryConfigRepo, CachedRouteRepo, CachedRoutingStrategyRepo,
    SeaOrmApiTokenRepo, SeaOrmCooldownRepo, SeaOrmModelMappingRepo, SeaOrmProjectRepo, SeaOrmProviderRepo,
    SeaOrmProxyRequestRepo, SeaOrmProxyUpstreamAttemptRepo, SeaOrmRetryConfigRepo, SeaOrmRouteRepo,
    SeaOrmRoutingStrategyRepo, SeaOrmSessionRepo, SeaOrmSystemSettingRepo,
};

use crate::cli::CliArgs;
use crate::dsn::{resolve_data_dir, resolve_dsn};

const KEY_HOST: &str = "host";
const KEY_PORT: &str = "port";
const KEY_ADMIN_TOKEN_HASH: &str = "admin_token_hash";
const KEY_OUTBOUND_PROXY: &str = "outbound_proxy";

/// Everything `main` needs to build the router and serve traffic.
pub struct Bootstrap {
    pub global: Arc<ArcSwap<GlobalConfig>>,
    pub cooldowns: Arc<CooldownRegistry>,
    pub events: EventHub,
    pub executor: Arc<RetryExecutor>,
    pub session_waiter: Arc<SessionWaiter>,
    pub admin_state: AdminState,
    pub api_tokens: Arc<dyn polyroute_model::repo::ApiTokenRepo>,
    pub sessions: Arc<dyn polyroute_model::repo::SessionRepo>,
}

pub async fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let data_dir = resolve_data_dir(&args.data_dir);
    let dsn = resolve_dsn(args.dsn.as_deref(), &data_dir)?;

    let db = polyroute_storage::connect(&dsn).await.context("connect storage")?;
    polyroute_storage::sync(&db).await.context("schema sync")?;

    let settings: Arc<dyn SystemSettingRepo> = Arc::new(SeaOrmSystemSettingRepo::new(db.clone()));
    let mut merged = load_patch_from_settings(settings.as_ref()).await?;

    let mut admin_token_hash_override = None;
    if let Some(plain) = non_empty(args.admin_token.as_deref()) {
        admin_token_hash_override = Some(hash_token(plain));
    } else if merged.admin_token_hash.is_none() {
        let plain = uuid::Uuid::now_v7().to_string();
        eprintln!("generated admin token: {plain}");
        admin_token_hash_override = Some(hash_token(&plain));
    }

    let cli_patch = GlobalConfigPatch {
        host: non_empty(args.host.as_deref()).map(str::to_string),
        port: parse_port(args.port.as_deref())?,
        admin_token_hash: admin_token_hash_override,
        dsn: Some(dsn),
        force_project_binding: parse_bool(args.force_project_binding.as_deref())?,
        force_project_timeout_secs: parse_u32(args.force_project_timeout.as_deref())?,
        event_redact_sensitive: parse_bool(args.event_redact_sensitive.as_deref())?,
        outbound_proxy: non_empty(args.proxy.as_deref()).map(str::to_string),
    };
    merged.overlay(cli_patch);
    let global = merged.into_config().context("finalize merged global config")?;
    persist_global_config(settings.as_ref(), &global).await?;

    let global = Arc::new(ArcSwap::from_pointee(global));

    let providers: Arc<dyn ProviderRepo> = Arc::new(CachedProviderRepo::new(Arc::new(SeaOrmProviderRepo::new(db.clone()))).await?);
    let projects = Arc::new(SeaOrmProjectRepo::new(db.clone()));
    let routes = Arc::new(CachedRouteRepo::new(Arc::new(SeaOrmRouteRepo::new(db.clone()))).await?);
    let strategies: Arc<dyn polyroute_model::repo::RoutingStrategyRepo> =
        Arc::new(CachedRoutingStrategyRepo::new(Arc::new(SeaOrmRoutingStrategyRepo::new(db.clone()))));
    let retry_configs = Arc::new(CachedRetryConfigRepo::new(Arc::new(SeaOrmRetryConfigRepo::new(db.clone()))).await?);
    let mappings = Arc::new(CachedModelMappingRepo::new(Arc::new(SeaOrmModelMappingRepo::new(db.clone()))).await?);
    let api_tokens: Arc<dyn polyroute_model::repo::ApiTokenRepo> = Arc::new(SeaOrmApiTokenRepo::new(db.clone()));
    let sessions: Arc<dyn polyroute_model::repo::SessionRepo> = Arc::new(SeaOrmSessionRepo::new(db.clone()));
    let requests = Arc::new(SeaOrmProxyRequestRepo::new(db.clone()));
    let attempts = Arc::new(SeaOrmProxyUpstreamAttemptRepo::new(db.clone()));
    let cooldown_repo = Arc::new(SeaOrmCooldownRepo::new(db.clone()));

    let events = EventHub::new();
    let (cooldowns, mut cooldown_writes) = CooldownRegistry::new(events.clone());
    let cooldowns = Arc::new(cooldowns);

    tokio::spawn({
        let cooldown_repo = cooldown_repo.clone();
        async move {
            use polyroute_model::repo::CooldownRepo as _;
            while let Some(cooldown) = cooldown_writes.recv().await {
                if let Err(err) = cooldown_repo.upsert(cooldown).await {
                    tracing::warn!(?err, "failed to persist cooldown update");
                }
            }
        }
    });
    tokio::spawn({
        let cooldowns = cooldowns.clone();
        async move {
            cooldowns.run_sweeper(now_unix_ms).await;
        }
    });
    tokio::spawn({
        let routes = routes.clone();
        async move {
            routes.run_refresher().await;
        }
    });

    let router = Arc::new(Router::new(
        routes.clone(),
        providers.clone(),
        strategies.clone(),
        retry_configs.clone(),
        mappings.clone(),
        cooldowns.clone(),
    ));

    let mut adapter_registry = AdapterRegistry::new();
    register_passthrough_adapters(&mut adapter_registry, providers.as_ref()).await?;
    let adapters = Arc::new(adapter_registry);

    let mut prices = PriceTable::new();
    seed_default_prices(&mut prices);
    let prices = Arc::new(prices);

    let recorder = Arc::new(polyroute_dispatch::Recorder::new(requests.clone(), attempts.clone(), events.clone()));

    let upstream_cfg = UpstreamClientConfig::default();
    let global_for_proxy = global.clone();
    let upstream: Arc<dyn polyroute_adapter::UpstreamClient> = Arc::new(WreqUpstreamClient::new_with_proxy_resolver(
        upstream_cfg,
        move || global_for_proxy.load().outbound_proxy.clone(),
    )?);

    let executor = Arc::new(RetryExecutor::new(router, cooldowns.clone(), recorder, prices, adapters, upstream));
    let session_waiter = Arc::new(SessionWaiter::new(sessions.clone(), events.clone()));

    let admin_state = AdminState {
        global: global.clone(),
        providers: providers.clone(),
        projects: projects.clone(),
        routes: routes.clone(),
        strategies: strategies.clone(),
        retry_configs: retry_configs.clone(),
        mappings: mappings.clone(),
        settings: settings.clone(),
        api_tokens: api_tokens.clone(),
        requests: requests.clone(),
        attempts: attempts.clone(),
        cooldowns: cooldowns.clone(),
        events: events.clone(),
    };

    events.publish(polyroute_events::Event::ServerStarted);

    Ok(Bootstrap {
        global,
        cooldowns,
        events,
        executor,
        session_waiter,
        admin_state,
        api_tokens,
        sessions,
    })
}

async fn register_passthrough_adapters(registry: &mut AdapterRegistry, providers: &dyn ProviderRepo) -> anyhow::Result<()> {
    let rows = providers.list().await.context("list providers for adapter registration")?;
    for provider in rows {
        let Some(base_url) = provider.config.get("base_url").and_then(|v| v.as_str()) else {
            continue;
        };
        for client_type in ClientType::ALL {
            if !provider.supports(client_type) {
                continue;
            }
            registry.register(
                client_type,
                provider.provider_type,
                Arc::new(polyroute_adapter::PassthroughAdapter::new(client_type, base_url)),
            );
        }
    }
    // Every (clientType, providerType) pair not backed by a configured
    // provider still resolves so a freshly-seeded deployment with no rows
    // yet doesn't silently drop every request; base url is a placeholder
    // until an admin creates a real provider.
    for client_type in ClientType::ALL {
        for provider_type in [ProviderType::Custom, ProviderType::Antigravity] {
            registry.register(
                client_type,
                provider_type,
                Arc::new(polyroute_adapter::PassthroughAdapter::new(client_type, "http://localhost:0")),
            );
        }
    }
    Ok(())
}

fn seed_default_prices(_prices: &mut PriceTable) {
    // Operators load real pricing out of band (§4.5 leaves the price table
    // a pure data structure); an empty table prices every model at 0 with
    // one warning log per lookup, which is the documented fallback.
}

async fn load_patch_from_settings(settings: &dyn SystemSettingRepo) -> anyhow::Result<GlobalConfigPatch> {
    use polyroute_model::system_setting::{KEY_FORCE_PROJECT_BINDING, KEY_FORCE_PROJECT_TIMEOUT};

    let mut patch = GlobalConfigPatch::default();
    if let Some(row) = settings.get(KEY_HOST).await? {
        patch.host = Some(row.value);
    }
    if let Some(row) = settings.get(KEY_PORT).await? {
        patch.port = row.value.parse().ok();
    }
    if let Some(row) = settings.get(KEY_ADMIN_TOKEN_HASH).await? {
        patch.admin_token_hash = Some(row.value);
    }
    if let Some(row) = settings.get(KEY_OUTBOUND_PROXY).await? {
        patch.outbound_proxy = Some(row.value);
    }
    if let Some(row) = settings.get(KEY_FORCE_PROJECT_BINDING).await? {
        patch.force_project_binding = Some(row.value == "true");
    }
    if let Some(row) = settings.get(KEY_FORCE_PROJECT_TIMEOUT).await? {
        patch.force_project_timeout_secs = row.value.parse().ok();
    }
    Ok(patch)
}

async fn persist_global_config(settings: &dyn SystemSettingRepo, global: &GlobalConfig) -> anyhow::Result<()> {
    use polyroute_model::system_setting::{KEY_FORCE_PROJECT_BINDING, KEY_FORCE_PROJECT_TIMEOUT};

    settings.set(KEY_HOST, &global.host).await?;
    settings.set(KEY_PORT, &global.port.to_string()).await?;
    settings.set(KEY_ADMIN_TOKEN_HASH, &global.admin_token_hash).await?;
    if let Some(proxy) = &global.outbound_proxy {
        settings.set(KEY_OUTBOUND_PROXY, proxy).await?;
    }
    settings
        .set(KEY_FORCE_PROJECT_BINDING, if global.force_project_binding { "true" } else { "false" })
        .await?;
    settings
        .set(KEY_FORCE_PROJECT_TIMEOUT, &global.force_project_timeout_secs.to_string())
        .await?;
    Ok(())
}

fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_port(value: Option<&str>) -> anyhow::Result<Option<u16>> {
    let Some(raw) = non_empty(value) else { return Ok(None) };
    Ok(Some(raw.parse().with_context(|| format!("invalid port: {raw}"))?))
}

fn parse_u32(value: Option<&str>) -> anyhow::Result<Option<u32>> {
    let Some(raw) = non_empty(value) else { return Ok(None) };
    Ok(Some(raw.parse().with_context(|| format!("invalid integer: {raw}"))?))
}

fn parse_bool(value: Option<&str>) -> anyhow::Result<Option<bool>> {
    let Some(raw) = non_empty(value) else { return Ok(None) };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => anyhow::bail!("invalid boolean value: {other}"),
    }
}

fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
