use serde::{Deserialize, Serialize};

/// Token counts extracted from an upstream response, or accumulated onto a
/// persisted row. Cache fields follow Anthropic's tiered-cache taxonomy;
/// providers that don't distinguish 5m/1h writes report everything under
/// `cache_5m_creation_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_5m_creation_tokens: u64,
    pub cache_1h_creation_tokens: u64,
}

impl Usage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens
            + self.output_tokens
            + self.cache_read_tokens
            + self.cache_5m_creation_tokens
            + self.cache_1h_creation_tokens
    }

    pub fn is_zero(&self) -> bool {
        *self == Usage::default()
    }
}
