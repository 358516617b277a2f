//! Upstream failure classification and cooldown policy (§4.3, §7). Adapters
//! wrap transport/HTTP faults into `UpstreamFailure`; `classify` turns that
//! into the taxonomy kind plus whatever cooldown update it implies.

use bytes::Bytes;
use polyroute_common::ClientType;
use polyroute_model::cooldown::CooldownCause;
use polyroute_model::ErrorKind;

use crate::types::{header_get, Headers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    ReadTimeout,
    Connect,
    Dns,
    Tls,
    Other,
}

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub quota_reset_unix_ms: Option<i64>,
    pub affected_client_type: Option<ClientType>,
}

#[derive(Debug, Clone)]
pub enum UpstreamFailure {
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
    Http {
        status: u16,
        headers: Headers,
        body: Bytes,
        rate_limit: Option<RateLimitInfo>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct CooldownDirective {
    pub client_type: Option<ClientType>,
    pub until_unix_ms: i64,
    pub cause: CooldownCause,
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub error_kind: ErrorKind,
    pub retryable: bool,
    pub cooldown: Option<CooldownDirective>,
}

const SERVER_ERROR_COOLDOWN_BASE_MS: i64 = 10_000;
const SERVER_ERROR_COOLDOWN_CAP_MS: i64 = 30 * 60 * 1000;
const NETWORK_ERROR_COOLDOWN_MS: i64 = 30_000;
const QUOTA_EXHAUSTED_CAP_MS: i64 = 60 * 60 * 1000;

/// `incremental_count` is the provider/clientType's running 5xx streak
/// (reset on any success, §4.3); pass 0 for the first occurrence.
pub fn classify(failure: &UpstreamFailure, now_unix_ms: i64, incremental_count: u32) -> Classification {
    match failure {
        UpstreamFailure::Http {
            status,
            headers,
            rate_limit,
            ..
        } => classify_http(*status, headers, rate_limit.as_ref(), now_unix_ms, incremental_count),
        UpstreamFailure::Transport { .. } => Classification {
            error_kind: ErrorKind::NetworkError,
            retryable: true,
            cooldown: Some(CooldownDirective {
                client_type: None,
                until_unix_ms: now_unix_ms + NETWORK_ERROR_COOLDOWN_MS,
                cause: CooldownCause::NetworkError,
            }),
        },
    }
}

fn classify_http(
    status: u16,
    headers: &Headers,
    rate_limit: Option<&RateLimitInfo>,
    now_unix_ms: i64,
    incremental_count: u32,
) -> Classification {
    if status == 429 {
        let (until_unix_ms, cause) = match rate_limit.and_then(|info| info.quota_reset_unix_ms) {
            Some(reset) => (reset.min(now_unix_ms + QUOTA_EXHAUSTED_CAP_MS), CooldownCause::QuotaExhausted),
            None => (
                now_unix_ms + retry_after_ms(headers).unwrap_or(QUOTA_EXHAUSTED_CAP_MS),
                CooldownCause::RetryAfterHeader,
            ),
        };
        return Classification {
            error_kind: ErrorKind::UpstreamHttpError,
            retryable: true,
            cooldown: Some(CooldownDirective {
                client_type: rate_limit.and_then(|info| info.affected_client_type),
                until_unix_ms,
                cause,
            }),
        };
    }
    if status == 401 || status == 403 {
        // Terminal for this route (§7); no cooldown policy is specified for
        // auth failures distinct from the generic upstream-error case, so
        // the provider simply stops being a candidate for this request.
        return Classification {
            error_kind: ErrorKind::UpstreamHttpError,
            retryable: false,
            cooldown: None,
        };
    }
    if (500..600).contains(&status) {
        let backoff = SERVER_ERROR_COOLDOWN_BASE_MS
            .saturating_mul(1i64 << incremental_count.min(16))
            .min(SERVER_ERROR_COOLDOWN_CAP_MS);
        return Classification {
            error_kind: ErrorKind::UpstreamHttpError,
            retryable: true,
            cooldown: Some(CooldownDirective {
                client_type: None,
                until_unix_ms: now_unix_ms + backoff,
                cause: CooldownCause::ServerError,
            }),
        };
    }
    Classification {
        error_kind: ErrorKind::UpstreamHttpError,
        retryable: false,
        cooldown: None,
    }
}

fn retry_after_ms(headers: &Headers) -> Option<i64> {
    let value = header_get(headers, "retry-after")?.trim();
    let secs: i64 = value.parse().ok()?;
    Some(secs * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_header_drives_cooldown() {
        let classification = classify_http(
            429,
            &vec![("Retry-After".to_string(), "30".to_string())],
            None,
            1_000,
            0,
        );
        let cooldown = classification.cooldown.unwrap();
        assert_eq!(cooldown.until_unix_ms, 1_000 + 30_000);
    }

    #[test]
    fn server_error_cooldown_doubles_and_caps() {
        let first = classify_http(500, &Vec::new(), None, 0, 0);
        let second = classify_http(500, &Vec::new(), None, 0, 1);
        assert_eq!(first.cooldown.unwrap().until_unix_ms, SERVER_ERROR_COOLDOWN_BASE_MS);
        assert_eq!(second.cooldown.unwrap().until_unix_ms, SERVER_ERROR_COOLDOWN_BASE_MS * 2);
        let saturated = classify_http(500, &Vec::new(), None, 0, 20);
        assert_eq!(saturated.cooldown.unwrap().until_unix_ms, SERVER_ERROR_COOLDOWN_CAP_MS);
    }

    #[test]
    fn auth_failure_is_terminal_without_cooldown() {
        let classification = classify_http(401, &Vec::new(), None, 0, 0);
        assert!(!classification.retryable);
        assert!(classification.cooldown.is_none());
    }

    #[test]
    fn network_error_gets_fixed_cooldown() {
        let classification = classify(
            &UpstreamFailure::Transport {
                kind: TransportErrorKind::Connect,
                message: "connection refused".into(),
            },
            0,
            0,
        );
        assert_eq!(classification.cooldown.unwrap().until_unix_ms, NETWORK_ERROR_COOLDOWN_MS);
    }
}
