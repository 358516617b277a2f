use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategyType {
    Priority,
    RoundRobin,
    Weighted,
}

impl Default for RoutingStrategyType {
    fn default() -> Self {
        RoutingStrategyType::Priority
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStrategy {
    pub id: i64,
    pub project_id: i64,
    pub strategy_type: RoutingStrategyType,
    /// providerId -> weight, only meaningful when `strategy_type` is `Weighted`.
    pub weights: BTreeMap<i64, u32>,
}

impl RoutingStrategy {
    pub fn weight_of(&self, provider_id: i64) -> u32 {
        self.weights.get(&provider_id).copied().unwrap_or(1)
    }
}
