use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};

/// A binding of (project, clientType, provider) with priority and retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    /// 0 = global.
    pub project_id: i64,
    pub client_type: ClientType,
    pub provider_id: i64,
    /// Unique within (project_id, client_type) after normalization.
    pub position: i32,
    pub enabled: bool,
    /// Native: provider natively speaks this client type. Converted: adapter translates.
    pub is_native: bool,
    pub retry_config_id: Option<i64>,
}
