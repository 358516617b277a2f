use std::collections::BTreeSet;

use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Custom,
    Antigravity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub provider_type: ProviderType,
    /// Provider-specific config (base url, credentials, …); opaque to the core.
    pub config: serde_json::Value,
    pub supported_client_types: BTreeSet<ClientType>,
}

impl Provider {
    pub fn supports(&self, client_type: ClientType) -> bool {
        self.supported_client_types.contains(&client_type)
    }
}
