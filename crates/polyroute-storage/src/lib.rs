//! SeaORM-backed persistence for every repository trait in
//! `polyroute_model::repo` (§10.5). This is the only crate permitted to
//! depend on `sea-orm`; everything above it talks to `dyn ...Repo`.

pub mod convert;
pub mod db;
pub mod entities;
pub mod repos;
pub mod snapshot;

pub use db::{connect, sync};
pub use repos::{
    SeaOrmApiTokenRepo, SeaOrmCooldownRepo, SeaOrmModelMappingRepo, SeaOrmProjectRepo,
    SeaOrmProviderRepo, SeaOrmProxyRequestRepo, SeaOrmProxyUpstreamAttemptRepo,
    SeaOrmRetryConfigRepo, SeaOrmRouteRepo, SeaOrmRoutingStrategyRepo, SeaOrmSessionRepo,
    SeaOrmSystemSettingRepo,
};
pub use snapshot::{
    CachedModelMappingRepo, CachedProviderRepo, CachedRetryConfigRepo, CachedRouteRepo,
    CachedRoutingStrategyRepo,
};
