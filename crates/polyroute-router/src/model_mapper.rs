//! Resolves a client-requested model name to the string to send upstream
//! (§4.1 step 5).

use polyroute_common::ClientType;
use polyroute_model::ModelMapping;

pub fn resolve_model(
    mappings: &[ModelMapping],
    client_type: ClientType,
    provider_id: Option<i64>,
    project_id: i64,
    api_token_id: Option<i64>,
    model_name: &str,
) -> String {
    let mut candidates: Vec<&ModelMapping> = mappings.iter().filter(|mapping| mapping.enabled).collect();
    candidates.sort_by_key(|mapping| mapping.priority);
    for mapping in candidates {
        if mapping
            .scope
            .matches(client_type, provider_id, project_id, api_token_id)
            && mapping.pattern.matches(model_name)
        {
            return mapping.target.clone();
        }
    }
    model_name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_model::model_mapping::{ModelMappingScope, ModelPattern};

    fn mapping(id: i64, priority: i32, pattern: ModelPattern, target: &str, scope: ModelMappingScope) -> ModelMapping {
        ModelMapping {
            id,
            pattern,
            target: target.to_string(),
            scope,
            priority,
            enabled: true,
        }
    }

    #[test]
    fn first_matching_rule_by_priority_wins() {
        let mappings = vec![
            mapping(1, 10, ModelPattern::Glob("claude-*".into()), "claude-a", ModelMappingScope::default()),
            mapping(2, 5, ModelPattern::Glob("claude-*".into()), "claude-b", ModelMappingScope::default()),
        ];
        let resolved = resolve_model(&mappings, ClientType::Claude, None, 0, None, "claude-3-opus");
        assert_eq!(resolved, "claude-b");
    }

    #[test]
    fn unmatched_model_passes_through() {
        let mappings = vec![mapping(
            1,
            0,
            ModelPattern::Exact("gpt-4".into()),
            "gpt-4-mapped",
            ModelMappingScope::default(),
        )];
        let resolved = resolve_model(&mappings, ClientType::Openai, None, 0, None, "gpt-5");
        assert_eq!(resolved, "gpt-5");
    }

    #[test]
    fn applying_twice_is_stable() {
        let mappings = vec![mapping(
            1,
            0,
            ModelPattern::Exact("gpt-4".into()),
            "gpt-4-mapped",
            ModelMappingScope::default(),
        )];
        let once = resolve_model(&mappings, ClientType::Openai, None, 0, None, "gpt-4");
        let twice = resolve_model(&mappings, ClientType::Openai, None, 0, None, &once);
        assert_eq!(once, "gpt-4-mapped");
        // re-resolving the already-mapped target is a no-op since no rule matches it
        assert_eq!(twice, once);
    }
}
