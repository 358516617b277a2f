use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::usage::Usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Failed,
}

/// Error taxonomy kinds (§7). Exactly one kind ever reaches the client: the
/// last attempt's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    FirstByteTimeout,
    StreamIdleTimeout,
    UpstreamHttpError,
    NetworkError,
    FormatConversion,
    UnsupportedFormat,
    ClientCancelled,
    AllRoutesFailed,
    NoRoutesAvailable,
}

impl ErrorKind {
    /// Whether this kind is eligible for another attempt, independent of
    /// `maxAttempts`/candidate exhaustion.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::FirstByteTimeout | ErrorKind::StreamIdleTimeout | ErrorKind::UpstreamHttpError | ErrorKind::NetworkError
        )
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::UnsupportedFormat => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::FormatConversion => 502,
            ErrorKind::AllRoutesFailed | ErrorKind::NoRoutesAvailable => 503,
            ErrorKind::FirstByteTimeout
            | ErrorKind::StreamIdleTimeout
            | ErrorKind::UpstreamHttpError
            | ErrorKind::NetworkError
            | ErrorKind::ClientCancelled => 502,
        }
    }
}

/// One physical dispatch to one upstream; append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyUpstreamAttempt {
    pub id: i64,
    pub proxy_request_id: i64,
    pub provider_id: i64,
    pub route_id: i64,
    pub sequence_no: u32,
    pub status: AttemptStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub http_status: Option<u16>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub usage: Usage,
    pub cost_micro_usd: i64,
}

impl ProxyUpstreamAttempt {
    pub fn duration(&self) -> Option<time::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}
