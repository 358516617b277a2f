pub mod api_tokens;
pub mod cooldowns;
pub mod model_mappings;
pub mod projects;
pub mod providers;
pub mod proxy_requests;
pub mod proxy_upstream_attempts;
pub mod retry_configs;
pub mod routes;
pub mod routing_strategies;
pub mod sessions;
pub mod system_settings;

pub use api_tokens::Entity as ApiTokens;
pub use cooldowns::Entity as Cooldowns;
pub use model_mappings::Entity as ModelMappings;
pub use projects::Entity as Projects;
pub use providers::Entity as Providers;
pub use proxy_requests::Entity as ProxyRequests;
pub use proxy_upstream_attempts::Entity as ProxyUpstreamAttempts;
pub use retry_configs::Entity as RetryConfigs;
pub use routes::Entity as Routes;
pub use routing_strategies::Entity as RoutingStrategies;
pub use sessions::Entity as Sessions;
pub use system_settings::Entity as SystemSettings;
