//! String <-> enum mappings for columns stored as plain text. Kept
//! explicit rather than round-tripped through serde_json so a renamed
//! Rust variant doesn't silently reshape a column's stored values.

use polyroute_common::ClientType;
use polyroute_model::cooldown::CooldownCause;
use polyroute_model::proxy_attempt::{AttemptStatus, ErrorKind};
use polyroute_model::proxy_request::ProxyRequestStatus;
use polyroute_model::routing_strategy::RoutingStrategyType;

pub fn client_type_to_string(client_type: Option<ClientType>) -> String {
    client_type.map(|c| c.as_str().to_string()).unwrap_or_default()
}

pub fn string_to_client_type(value: &str) -> Option<ClientType> {
    if value.is_empty() {
        None
    } else {
        value.parse().ok()
    }
}

pub fn cooldown_cause_to_string(cause: CooldownCause) -> &'static str {
    match cause {
        CooldownCause::RetryAfterHeader => "retry_after_header",
        CooldownCause::QuotaExhausted => "quota_exhausted",
        CooldownCause::ServerError => "server_error",
        CooldownCause::NetworkError => "network_error",
    }
}

pub fn string_to_cooldown_cause(value: &str) -> CooldownCause {
    match value {
        "quota_exhausted" => CooldownCause::QuotaExhausted,
        "server_error" => CooldownCause::ServerError,
        "network_error" => CooldownCause::NetworkError,
        _ => CooldownCause::RetryAfterHeader,
    }
}

pub fn strategy_type_to_string(strategy_type: RoutingStrategyType) -> &'static str {
    match strategy_type {
        RoutingStrategyType::Priority => "priority",
        RoutingStrategyType::RoundRobin => "round_robin",
        RoutingStrategyType::Weighted => "weighted",
    }
}

pub fn string_to_strategy_type(value: &str) -> RoutingStrategyType {
    match value {
        "round_robin" => RoutingStrategyType::RoundRobin,
        "weighted" => RoutingStrategyType::Weighted,
        _ => RoutingStrategyType::Priority,
    }
}

pub fn request_status_to_string(status: ProxyRequestStatus) -> &'static str {
    match status {
        ProxyRequestStatus::Pending => "pending",
        ProxyRequestStatus::InProgress => "in_progress",
        ProxyRequestStatus::Completed => "completed",
        ProxyRequestStatus::Failed => "failed",
        ProxyRequestStatus::Cancelled => "cancelled",
    }
}

pub fn string_to_request_status(value: &str) -> ProxyRequestStatus {
    match value {
        "in_progress" => ProxyRequestStatus::InProgress,
        "completed" => ProxyRequestStatus::Completed,
        "failed" => ProxyRequestStatus::Failed,
        "cancelled" => ProxyRequestStatus::Cancelled,
        _ => ProxyRequestStatus::Pending,
    }
}

pub fn attempt_status_to_string(status: AttemptStatus) -> &'static str {
    match status {
        AttemptStatus::InProgress => "in_progress",
        AttemptStatus::Completed => "completed",
        AttemptStatus::Failed => "failed",
    }
}

pub fn string_to_attempt_status(value: &str) -> AttemptStatus {
    match value {
        "completed" => AttemptStatus::Completed,
        "failed" => AttemptStatus::Failed,
        _ => AttemptStatus::InProgress,
    }
}

pub fn error_kind_to_string(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidInput => "invalid_input",
        ErrorKind::NotFound => "not_found",
        ErrorKind::AlreadyExists => "already_exists",
        ErrorKind::FirstByteTimeout => "first_byte_timeout",
        ErrorKind::StreamIdleTimeout => "stream_idle_timeout",
        ErrorKind::UpstreamHttpError => "upstream_http_error",
        ErrorKind::NetworkError => "network_error",
        ErrorKind::FormatConversion => "format_conversion",
        ErrorKind::UnsupportedFormat => "unsupported_format",
        ErrorKind::ClientCancelled => "client_cancelled",
        ErrorKind::AllRoutesFailed => "all_routes_failed",
        ErrorKind::NoRoutesAvailable => "no_routes_available",
    }
}

pub fn string_to_error_kind(value: &str) -> Option<ErrorKind> {
    Some(match value {
        "invalid_input" => ErrorKind::InvalidInput,
        "not_found" => ErrorKind::NotFound,
        "already_exists" => ErrorKind::AlreadyExists,
        "first_byte_timeout" => ErrorKind::FirstByteTimeout,
        "stream_idle_timeout" => ErrorKind::StreamIdleTimeout,
        "upstream_http_error" => ErrorKind::UpstreamHttpError,
        "network_error" => ErrorKind::NetworkError,
        "format_conversion" => ErrorKind::FormatConversion,
        "unsupported_format" => ErrorKind::UnsupportedFormat,
        "client_cancelled" => ErrorKind::ClientCancelled,
        "all_routes_failed" => ErrorKind::AllRoutesFailed,
        "no_routes_available" => ErrorKind::NoRoutesAvailable,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_type_round_trips_including_wildcard() {
        assert_eq!(string_to_client_type(&client_type_to_string(Some(ClientType::Gemini))), Some(ClientType::Gemini));
        assert_eq!(string_to_client_type(&client_type_to_string(None)), None);
    }

    #[test]
    fn error_kind_round_trips() {
        for kind in [
            ErrorKind::InvalidInput,
            ErrorKind::FirstByteTimeout,
            ErrorKind::AllRoutesFailed,
        ] {
            assert_eq!(string_to_error_kind(error_kind_to_string(kind)), Some(kind));
        }
    }
}
