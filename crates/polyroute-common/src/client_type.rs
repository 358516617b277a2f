use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The wire format a caller speaks. See GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Claude,
    Openai,
    Codex,
    Gemini,
}

impl ClientType {
    pub const ALL: [ClientType; 4] = [
        ClientType::Claude,
        ClientType::Openai,
        ClientType::Codex,
        ClientType::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Claude => "claude",
            ClientType::Openai => "openai",
            ClientType::Codex => "codex",
            ClientType::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown client type: {0}")]
pub struct ParseClientTypeError(String);

impl FromStr for ClientType {
    type Err = ParseClientTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ClientType::Claude),
            "openai" => Ok(ClientType::Openai),
            "codex" => Ok(ClientType::Codex),
            "gemini" => Ok(ClientType::Gemini),
            other => Err(ParseClientTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for ct in ClientType::ALL {
            assert_eq!(ct.as_str().parse::<ClientType>().unwrap(), ct);
        }
    }

    #[test]
    fn rejects_unknown() {
        assert!("anthropic".parse::<ClientType>().is_err());
    }
}
