use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub id: i64,
    pub is_default: bool,
    pub max_attempts: u32,
    pub first_byte_timeout_ms: u64,
    pub stream_idle_timeout_ms: u64,
    pub backoff_seed_ms: u64,
}

impl RetryConfig {
    pub fn fallback_default() -> Self {
        Self {
            id: 0,
            is_default: true,
            max_attempts: 3,
            first_byte_timeout_ms: 30_000,
            stream_idle_timeout_ms: 60_000,
            backoff_seed_ms: 200,
        }
    }
}
