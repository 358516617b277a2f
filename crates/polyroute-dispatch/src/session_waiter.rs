//! Blocks a session until the UI binds a project or the wait times out or
//! is rejected, when force-project-binding is enabled (§4.6).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use polyroute_common::ClientType;
use polyroute_events::{Event, EventHub, NewSessionPending, SessionPendingCancelled};
use polyroute_model::repo::SessionRepo;
use std::sync::Arc;
use time::OffsetDateTime;

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const BROADCAST_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Bound(i64),
    Rejected,
    Timeout,
}

pub struct SessionWaiter {
    sessions: Arc<dyn SessionRepo>,
    events: EventHub,
    last_broadcast: Mutex<HashMap<String, Instant>>,
}

impl SessionWaiter {
    pub fn new(sessions: Arc<dyn SessionRepo>, events: EventHub) -> Self {
        Self {
            sessions,
            events,
            last_broadcast: Mutex::new(HashMap::new()),
        }
    }

    pub async fn wait(&self, session_id: &str, client_type: ClientType, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut ever_broadcast = false;
        loop {
            if let Ok(Some(session)) = self.sessions.get(session_id).await {
                if session.is_bound() {
                    self.cancel_pending(session_id, ever_broadcast);
                    return WaitOutcome::Bound(session.project_id.expect("is_bound guarantees Some"));
                }
                if let Some(rejected_at) = session.rejected_at {
                    if rejection_is_fresh(rejected_at) {
                        self.cancel_pending(session_id, ever_broadcast);
                        return WaitOutcome::Rejected;
                    }
                    let _ = self.sessions.clear_rejection(session_id).await;
                }
            }
            if Instant::now() >= deadline {
                self.cancel_pending(session_id, ever_broadcast);
                return WaitOutcome::Timeout;
            }
            if self.maybe_broadcast(session_id, client_type) {
                ever_broadcast = true;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn maybe_broadcast(&self, session_id: &str, client_type: ClientType) -> bool {
        let mut last = self.last_broadcast.lock().expect("broadcast map poisoned");
        let now = Instant::now();
        let should_broadcast = match last.get(session_id) {
            Some(previous) => now.duration_since(*previous) >= BROADCAST_COOLDOWN,
            None => true,
        };
        if should_broadcast {
            last.insert(session_id.to_string(), now);
            self.events.publish(Event::NewSessionPending(NewSessionPending {
                session_id: session_id.to_string(),
                client_type,
            }));
        }
        should_broadcast
    }

    fn cancel_pending(&self, session_id: &str, ever_broadcast: bool) {
        self.last_broadcast.lock().expect("broadcast map poisoned").remove(session_id);
        if ever_broadcast {
            self.events.publish(Event::SessionPendingCancelled(SessionPendingCancelled {
                session_id: session_id.to_string(),
            }));
        }
    }
}

fn rejection_is_fresh(rejected_at: OffsetDateTime) -> bool {
    let age = OffsetDateTime::now_utc() - rejected_at;
    age >= time::Duration::ZERO && age <= time::Duration::seconds(BROADCAST_COOLDOWN.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn fresh_rejection_within_cooldown_window() {
        let now = OffsetDateTime::now_utc();
        assert!(rejection_is_fresh(now));
        assert!(!rejection_is_fresh(now - time::Duration::seconds(30)));
    }

    struct FakeSessionRepo(StdMutex<polyroute_model::Session>);

    #[async_trait::async_trait]
    impl SessionRepo for FakeSessionRepo {
        async fn get(&self, session_id: &str) -> Result<Option<polyroute_model::Session>, polyroute_model::repo::RepoError> {
            let session = self.0.lock().unwrap();
            Ok((session.session_id == session_id).then(|| session.clone()))
        }
        async fn upsert(&self, session: polyroute_model::Session) -> Result<polyroute_model::Session, polyroute_model::repo::RepoError> {
            *self.0.lock().unwrap() = session.clone();
            Ok(session)
        }
        async fn bind_project(&self, session_id: &str, project_id: i64) -> Result<polyroute_model::Session, polyroute_model::repo::RepoError> {
            let mut session = self.0.lock().unwrap();
            if session.session_id != session_id {
                return Err(polyroute_model::repo::RepoError::NotFound);
            }
            session.project_id = Some(project_id);
            Ok(session.clone())
        }
        async fn reject(&self, session_id: &str, now: OffsetDateTime) -> Result<polyroute_model::Session, polyroute_model::repo::RepoError> {
            let mut session = self.0.lock().unwrap();
            if session.session_id != session_id {
                return Err(polyroute_model::repo::RepoError::NotFound);
            }
            session.rejected_at = Some(now);
            Ok(session.clone())
        }
        async fn clear_rejection(&self, session_id: &str) -> Result<(), polyroute_model::repo::RepoError> {
            let mut session = self.0.lock().unwrap();
            if session.session_id == session_id {
                session.rejected_at = None;
            }
            Ok(())
        }
    }

    /// Scenario 5 (§8): a new session with no bound project eventually gets
    /// bound by the UI while a caller is parked in `wait`; the broadcast
    /// fires at least once and the waiter resumes with the bound project
    /// well before its timeout, not because the timeout elapsed.
    #[tokio::test(start_paused = true)]
    async fn binds_before_timeout_and_resumes_with_project() {
        let session = polyroute_model::Session::new("sess-1".to_string(), ClientType::Claude, OffsetDateTime::now_utc());
        let sessions: Arc<dyn SessionRepo> = Arc::new(FakeSessionRepo(StdMutex::new(session)));
        let events = EventHub::new();
        let subscription = events.subscribe();
        let waiter = Arc::new(SessionWaiter::new(sessions.clone(), events));

        let wait_waiter = waiter.clone();
        let wait_handle = tokio::spawn(async move {
            wait_waiter.wait("sess-1", ClientType::Claude, Duration::from_secs(30)).await
        });

        let broadcast = subscription.recv().await;
        assert!(matches!(broadcast, Event::NewSessionPending(ref pending) if pending.session_id == "sess-1"));

        sessions.bind_project("sess-1", 42).await.expect("bind succeeds");

        let outcome = wait_handle.await.expect("wait task does not panic");
        assert_eq!(outcome, WaitOutcome::Bound(42));
    }
}
