//! Maps a response body (full JSON or one accumulated SSE event) to a
//! token-count record, detecting the wire shape by field presence rather
//! than by trusting the declared client type (§4.5).

use polyroute_model::Usage;
use serde_json::Value;

/// One detected usage reading together with whether the event it came
/// from is a terminal override (message_delta / response.completed),
/// which wins over any earlier partial regardless of arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub usage: Usage,
    pub terminal: bool,
}

/// Detects a usage shape anywhere in `value` and, if found, normalizes it
/// into a `Usage`. Order of detection mirrors the grounding codebase's
/// accumulator: Claude `usage`, Gemini `usageMetadata`, OpenAI Responses
/// `response.usage`, classic OpenAI `usage`.
pub fn extract(value: &Value) -> Option<Reading> {
    if let Some(usage) = value.get("usage") {
        if looks_like_claude_usage(usage) {
            let terminal = value.get("type").and_then(Value::as_str) == Some("message_delta");
            return Some(Reading {
                usage: claude_usage(usage),
                terminal,
            });
        }
        if looks_like_openai_chat_usage(usage) {
            return Some(Reading {
                usage: openai_chat_usage(usage),
                terminal: false,
            });
        }
    }
    if let Some(usage) = value.get("usageMetadata") {
        return Some(Reading {
            usage: gemini_usage(usage),
            terminal: false,
        });
    }
    if let Some(response) = value.get("response")
        && let Some(usage) = response.get("usage")
    {
        let terminal = value.get("type").and_then(Value::as_str) == Some("response.completed");
        return Some(Reading {
            usage: openai_response_usage(usage),
            terminal,
        });
    }
    None
}

/// Folds a sequence of SSE-derived readings into one `Usage` using
/// last-wins semantics, except a terminal reading always overrides any
/// non-terminal reading seen after it (§4.5).
#[derive(Debug, Clone, Default)]
pub struct SseAccumulator {
    latest: Option<Usage>,
    terminal_locked: bool,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: &Value) {
        let Some(reading) = extract(value) else {
            return;
        };
        if self.terminal_locked && !reading.terminal {
            return;
        }
        self.latest = Some(reading.usage);
        if reading.terminal {
            self.terminal_locked = true;
        }
    }

    pub fn finalize(self) -> Option<Usage> {
        self.latest
    }
}

fn looks_like_claude_usage(value: &Value) -> bool {
    value.get("input_tokens").is_some() || value.get("output_tokens").is_some()
}

fn looks_like_openai_chat_usage(value: &Value) -> bool {
    value.get("prompt_tokens").is_some() || value.get("completion_tokens").is_some()
}

fn claude_usage(value: &Value) -> Usage {
    Usage {
        input_tokens: u64_field(value, "input_tokens"),
        output_tokens: u64_field(value, "output_tokens"),
        cache_read_tokens: u64_field(value, "cache_read_input_tokens"),
        cache_5m_creation_tokens: u64_field(value, "cache_creation_input_tokens"),
        cache_1h_creation_tokens: u64_field_path(
            value,
            &["cache_creation", "ephemeral_1h_input_tokens"],
        ),
    }
}

fn openai_chat_usage(value: &Value) -> Usage {
    Usage {
        input_tokens: u64_field(value, "prompt_tokens"),
        output_tokens: u64_field(value, "completion_tokens"),
        cache_read_tokens: u64_field_path(value, &["prompt_tokens_details", "cached_tokens"]),
        cache_5m_creation_tokens: 0,
        cache_1h_creation_tokens: 0,
    }
}

/// OpenAI Responses/Codex: `input_tokens` counts cached reads too, so they
/// are subtracted back out to avoid double counting (§4.5).
fn openai_response_usage(value: &Value) -> Usage {
    let raw_input = u64_field(value, "input_tokens");
    let cache_read = u64_field_path(value, &["input_tokens_details", "cached_tokens"]);
    Usage {
        input_tokens: raw_input.saturating_sub(cache_read),
        output_tokens: u64_field(value, "output_tokens"),
        cache_read_tokens: cache_read,
        cache_5m_creation_tokens: 0,
        cache_1h_creation_tokens: 0,
    }
}

/// Gemini: cached tokens are subtracted from `promptTokenCount` to get
/// pure input, and `thoughtsTokenCount` is folded into output (§4.5).
fn gemini_usage(value: &Value) -> Usage {
    let prompt = u64_field(value, "promptTokenCount");
    let cached = u64_field(value, "cachedContentTokenCount");
    let candidates = u64_field(value, "candidatesTokenCount");
    let thoughts = u64_field(value, "thoughtsTokenCount");
    Usage {
        input_tokens: prompt.saturating_sub(cached),
        output_tokens: candidates + thoughts,
        cache_read_tokens: cached,
        cache_5m_creation_tokens: 0,
        cache_1h_creation_tokens: 0,
    }
}

fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn u64_field_path(value: &Value, path: &[&str]) -> u64 {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return 0,
        }
    }
    current.as_u64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_claude_usage() {
        let body = json!({"usage": {"input_tokens": 10, "output_tokens": 5, "cache_read_input_tokens": 2}});
        let reading = extract(&body).unwrap();
        assert_eq!(reading.usage.input_tokens, 10);
        assert_eq!(reading.usage.output_tokens, 5);
        assert_eq!(reading.usage.cache_read_tokens, 2);
        assert!(!reading.terminal);
    }

    #[test]
    fn detects_openai_responses_usage_and_subtracts_cache() {
        let body = json!({
            "type": "response.completed",
            "response": {"usage": {"input_tokens": 100, "output_tokens": 20, "input_tokens_details": {"cached_tokens": 30}}}
        });
        let reading = extract(&body).unwrap();
        assert_eq!(reading.usage.input_tokens, 70);
        assert_eq!(reading.usage.cache_read_tokens, 30);
        assert!(reading.terminal);
    }

    #[test]
    fn detects_gemini_usage_and_folds_thoughts_into_output() {
        let body = json!({"usageMetadata": {"promptTokenCount": 50, "cachedContentTokenCount": 10, "candidatesTokenCount": 5, "thoughtsTokenCount": 3}});
        let reading = extract(&body).unwrap();
        assert_eq!(reading.usage.input_tokens, 40);
        assert_eq!(reading.usage.output_tokens, 8);
    }

    #[test]
    fn sse_accumulator_last_wins_until_terminal_locks() {
        let mut acc = SseAccumulator::new();
        acc.push(&json!({"usage": {"input_tokens": 1, "output_tokens": 1}}));
        acc.push(&json!({"type": "message_delta", "usage": {"input_tokens": 1, "output_tokens": 9}}));
        acc.push(&json!({"usage": {"input_tokens": 1, "output_tokens": 999}}));
        let usage = acc.finalize().unwrap();
        assert_eq!(usage.output_tokens, 9);
    }

    #[test]
    fn extraction_is_idempotent() {
        let body = json!({"usage": {"input_tokens": 10, "output_tokens": 5}});
        let first = extract(&body).unwrap();
        let reserialized = serde_json::to_value(&json!({"usage": {
            "input_tokens": first.usage.input_tokens,
            "output_tokens": first.usage.output_tokens,
        }}))
        .unwrap();
        let second = extract(&reserialized).unwrap();
        assert_eq!(first.usage.input_tokens, second.usage.input_tokens);
        assert_eq!(first.usage.output_tokens, second.usage.output_tokens);
    }
}
