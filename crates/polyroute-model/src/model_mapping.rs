use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelPattern {
    Exact(String),
    /// `*` matches any run of characters; anchored to the whole string.
    Glob(String),
}

impl ModelPattern {
    pub fn matches(&self, model: &str) -> bool {
        match self {
            ModelPattern::Exact(expected) => expected == model,
            ModelPattern::Glob(pattern) => glob_match(pattern, model),
        }
    }
}

fn glob_match(pattern: &str, input: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == input;
    }
    let mut rest = input;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(segment) {
                return false;
            }
            rest = &rest[segment.len()..];
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else if let Some(pos) = rest.find(segment) {
            rest = &rest[pos + segment.len()..];
        } else {
            return false;
        }
    }
    true
}

/// Scope filters for a mapping rule; an empty field means "wildcard" within
/// that scope (§4.1 step 5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMappingScope {
    pub client_type: Option<ClientType>,
    pub provider_type: Option<String>,
    pub provider_id: Option<i64>,
    pub project_id: Option<i64>,
    pub api_token_id: Option<i64>,
}

impl ModelMappingScope {
    pub fn matches(
        &self,
        client_type: ClientType,
        provider_id: Option<i64>,
        project_id: i64,
        api_token_id: Option<i64>,
    ) -> bool {
        if let Some(expected) = self.client_type
            && expected != client_type
        {
            return false;
        }
        if let (Some(expected), Some(actual)) = (self.provider_id, provider_id)
            && expected != actual
        {
            return false;
        }
        if let Some(expected) = self.project_id
            && expected != project_id
        {
            return false;
        }
        if let (Some(expected), Some(actual)) = (self.api_token_id, api_token_id)
            && expected != actual
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMapping {
    pub id: i64,
    pub pattern: ModelPattern,
    pub target: String,
    pub scope: ModelMappingScope,
    /// Ascending; first match within scope wins.
    pub priority: i32,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_prefix_suffix() {
        assert!(glob_match("claude-*", "claude-3-opus"));
        assert!(!glob_match("claude-*", "gpt-4"));
        assert!(glob_match("*-latest", "claude-3-latest"));
        assert!(glob_match("gpt-*-turbo", "gpt-4-turbo"));
    }

    #[test]
    fn exact_pattern_requires_full_match() {
        let pattern = ModelPattern::Exact("gpt-4".into());
        assert!(pattern.matches("gpt-4"));
        assert!(!pattern.matches("gpt-4-turbo"));
    }
}
