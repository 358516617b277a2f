use polyroute_common::ClientType;
use polyroute_model::ProxyRequest;
use serde::{Deserialize, Serialize};

/// Canonical event names (§6, §4.7, §4.8). Wire shape is always
/// `{ "type": <name>, "data": <object> }`; `Event::name()` and the
/// `Serialize` impl below must stay in sync with this list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    ProxyRequestUpdate(ProxyRequest),
    CooldownUpdate(CooldownUpdate),
    NewSessionPending(NewSessionPending),
    SessionPendingCancelled(SessionPendingCancelled),
    #[serde(rename = "server-started")]
    ServerStarted,
    #[serde(rename = "server-stopped")]
    ServerStopped,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProxyRequestUpdate(_) => "proxy_request_update",
            Event::CooldownUpdate(_) => "cooldown_update",
            Event::NewSessionPending(_) => "new_session_pending",
            Event::SessionPendingCancelled(_) => "session_pending_cancelled",
            Event::ServerStarted => "server-started",
            Event::ServerStopped => "server-stopped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownUpdate {
    pub provider_id: i64,
    pub client_type: Option<ClientType>,
    pub until_unix_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionPending {
    pub session_id: String,
    pub client_type: ClientType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPendingCancelled {
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_name_matches_serialized_tag() {
        let event = Event::CooldownUpdate(CooldownUpdate {
            provider_id: 1,
            client_type: None,
            until_unix_ms: 0,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.name());
    }
}
