use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownCause {
    RetryAfterHeader,
    QuotaExhausted,
    ServerError,
    NetworkError,
}

/// Keyed by `(provider_id, client_type)`. `client_type = None` means "all client
/// types" and coexists with a specific-client-type entry for the same provider;
/// either matching entry cools the route down (§9 open question #2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldown {
    pub provider_id: i64,
    pub client_type: Option<ClientType>,
    pub until_unix_ms: i64,
    pub cause: CooldownCause,
    pub incremental_count: u32,
}
