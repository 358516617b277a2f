use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::usage::Usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyRequestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl ProxyRequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProxyRequestStatus::Completed | ProxyRequestStatus::Failed | ProxyRequestStatus::Cancelled
        )
    }

    /// Status is monotone PENDING -> IN_PROGRESS -> terminal; this rejects
    /// any transition that would move backwards or re-enter a terminal state.
    pub fn can_transition_to(self, next: ProxyRequestStatus) -> bool {
        use ProxyRequestStatus::*;
        match (self, next) {
            (Pending, InProgress) | (Pending, Completed | Failed | Cancelled) => true,
            (InProgress, Completed | Failed | Cancelled) => true,
            (a, b) if a == b => false,
            _ => false,
        }
    }
}

/// One logical request; may span multiple `ProxyUpstreamAttempt` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub status: ProxyRequestStatus,
    pub client_type: ClientType,
    pub request_model: String,
    pub response_model: Option<String>,
    pub session_id: Option<String>,
    pub project_id: i64,
    /// Microdollars.
    pub cost_micro_usd: i64,
    pub usage: Usage,
}

impl ProxyRequest {
    pub fn new(
        id: i64,
        start_time: OffsetDateTime,
        client_type: ClientType,
        request_model: String,
        session_id: Option<String>,
        project_id: i64,
    ) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            status: ProxyRequestStatus::Pending,
            client_type,
            request_model,
            response_model: None,
            session_id,
            project_id,
            cost_micro_usd: 0,
            usage: Usage::default(),
        }
    }

    pub fn duration(&self) -> Option<time::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_monotone() {
        use ProxyRequestStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }
}
