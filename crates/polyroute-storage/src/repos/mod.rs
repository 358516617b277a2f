pub mod api_token;
pub mod cooldown;
pub mod model_mapping;
pub mod project;
pub mod provider;
pub mod proxy_attempt;
pub mod proxy_request;
pub mod retry_config;
pub mod route;
pub mod routing_strategy;
pub mod session;
pub mod system_setting;

pub use api_token::SeaOrmApiTokenRepo;
pub use cooldown::SeaOrmCooldownRepo;
pub use model_mapping::SeaOrmModelMappingRepo;
pub use project::SeaOrmProjectRepo;
pub use provider::SeaOrmProviderRepo;
pub use proxy_attempt::SeaOrmProxyUpstreamAttemptRepo;
pub use proxy_request::SeaOrmProxyRequestRepo;
pub use retry_config::SeaOrmRetryConfigRepo;
pub use route::SeaOrmRouteRepo;
pub use routing_strategy::SeaOrmRoutingStrategyRepo;
pub use session::SeaOrmSessionRepo;
pub use system_setting::SeaOrmSystemSettingRepo;
