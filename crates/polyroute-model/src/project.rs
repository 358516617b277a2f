use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Unique, URL-safe. See `polyroute_common::slug::slugify`.
    pub slug: String,
    pub routing_strategy_id: i64,
}
