use polyroute_common::ClientType;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A correlation id the caller supplies; lets the admin UI bind all requests
/// from a tool session to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub client_type: ClientType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Once non-zero, immutable for this session.
    pub project_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub rejected_at: Option<OffsetDateTime>,
}

impl Session {
    pub fn new(session_id: String, client_type: ClientType, now: OffsetDateTime) -> Self {
        Self {
            session_id,
            client_type,
            created_at: now,
            project_id: None,
            rejected_at: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.project_id, Some(id) if id > 0)
    }
}
