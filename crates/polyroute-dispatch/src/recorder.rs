//! Writes one `ProxyRequest` row per logical request and one
//! `ProxyUpstreamAttempt` row per physical attempt; emits
//! `proxy_request_update` after every state change (§4.7).

use std::sync::Arc;

use polyroute_common::ClientType;
use polyroute_events::{Event, EventHub};
use polyroute_model::repo::{ProxyRequestRepo, ProxyUpstreamAttemptRepo, RepoError};
use polyroute_model::{
    AttemptStatus, ErrorKind, ProxyRequest, ProxyRequestStatus, ProxyUpstreamAttempt, Usage,
};
use time::OffsetDateTime;

pub struct Recorder {
    requests: Arc<dyn ProxyRequestRepo>,
    attempts: Arc<dyn ProxyUpstreamAttemptRepo>,
    events: EventHub,
}

impl Recorder {
    pub fn new(
        requests: Arc<dyn ProxyRequestRepo>,
        attempts: Arc<dyn ProxyUpstreamAttemptRepo>,
        events: EventHub,
    ) -> Self {
        Self {
            requests,
            attempts,
            events,
        }
    }

    pub async fn start_request(
        &self,
        client_type: ClientType,
        request_model: String,
        session_id: Option<String>,
        project_id: i64,
        now: OffsetDateTime,
    ) -> Result<ProxyRequest, RepoError> {
        let request = ProxyRequest::new(0, now, client_type, request_model, session_id, project_id);
        let saved = self.requests.insert(request).await?;
        self.publish_request(&saved);
        Ok(saved)
    }

    pub async fn mark_in_progress(&self, mut request: ProxyRequest) -> Result<ProxyRequest, RepoError> {
        request.status = ProxyRequestStatus::InProgress;
        let saved = self.requests.update(request).await?;
        self.publish_request(&saved);
        Ok(saved)
    }

    pub async fn finish_request(
        &self,
        mut request: ProxyRequest,
        status: ProxyRequestStatus,
        response_model: Option<String>,
        usage: Usage,
        cost_micro_usd: i64,
        now: OffsetDateTime,
    ) -> Result<ProxyRequest, RepoError> {
        request.status = status;
        request.response_model = response_model;
        request.usage = usage;
        request.cost_micro_usd = cost_micro_usd;
        request.end_time = Some(now);
        let saved = self.requests.update(request).await?;
        self.publish_request(&saved);
        Ok(saved)
    }

    pub async fn start_attempt(
        &self,
        proxy_request_id: i64,
        provider_id: i64,
        route_id: i64,
        sequence_no: u32,
        now: OffsetDateTime,
    ) -> Result<ProxyUpstreamAttempt, RepoError> {
        let attempt = ProxyUpstreamAttempt {
            id: 0,
            proxy_request_id,
            provider_id,
            route_id,
            sequence_no,
            status: AttemptStatus::InProgress,
            started_at: now,
            ended_at: None,
            http_status: None,
            error_kind: None,
            error_message: None,
            usage: Usage::default(),
            cost_micro_usd: 0,
        };
        self.attempts.insert(attempt).await
    }

    pub async fn complete_attempt(
        &self,
        mut attempt: ProxyUpstreamAttempt,
        usage: Usage,
        cost_micro_usd: i64,
        http_status: Option<u16>,
        now: OffsetDateTime,
    ) -> Result<ProxyUpstreamAttempt, RepoError> {
        attempt.status = AttemptStatus::Completed;
        attempt.usage = usage;
        attempt.cost_micro_usd = cost_micro_usd;
        attempt.http_status = http_status;
        attempt.ended_at = Some(now);
        self.attempts.update(attempt).await
    }

    pub async fn fail_attempt(
        &self,
        mut attempt: ProxyUpstreamAttempt,
        error_kind: ErrorKind,
        error_message: String,
        http_status: Option<u16>,
        now: OffsetDateTime,
    ) -> Result<ProxyUpstreamAttempt, RepoError> {
        attempt.status = AttemptStatus::Failed;
        attempt.error_kind = Some(error_kind);
        attempt.error_message = Some(error_message);
        attempt.http_status = http_status;
        attempt.ended_at = Some(now);
        self.attempts.update(attempt).await
    }

    fn publish_request(&self, request: &ProxyRequest) {
        self.events.publish(Event::ProxyRequestUpdate(request.clone()));
    }
}
