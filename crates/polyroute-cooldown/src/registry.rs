//! In-memory authoritative cooldown map (§4.4). The Router consults this
//! exclusively; no other subsystem mutates provider cooldown state.

use std::collections::HashMap;
use std::sync::Mutex;

use polyroute_common::ClientType;
use polyroute_events::{CooldownUpdate, Event, EventHub};
use polyroute_model::Cooldown;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};

/// How often the sweeper removes expired entries (§4.4).
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

const WRITE_THROUGH_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    provider_id: i64,
    client_type: Option<ClientType>,
}

/// `setIfLater`/`get`/`clear`/`snapshot` plus a background sweeper and an
/// async write-through to whatever repository the caller wires up.
pub struct CooldownRegistry {
    entries: Mutex<HashMap<Key, Cooldown>>,
    events: EventHub,
    write_through: mpsc::Sender<Cooldown>,
}

impl CooldownRegistry {
    /// Returns the registry plus the receiving half of its write-through
    /// channel; the caller spawns a task draining it into a repository.
    pub fn new(events: EventHub) -> (Self, mpsc::Receiver<Cooldown>) {
        let (tx, rx) = mpsc::channel(WRITE_THROUGH_CAPACITY);
        (
            Self {
                entries: Mutex::new(HashMap::new()),
                events,
                write_through: tx,
            },
            rx,
        )
    }

    /// True if `provider_id` is currently cooled down for `client_type`,
    /// matching either a specific-clientType entry or an empty one — the
    /// two coexist and either can cool the route (§9).
    pub fn is_cooling(&self, provider_id: i64, client_type: ClientType, now_unix_ms: i64) -> bool {
        self.get(provider_id, Some(client_type), now_unix_ms).is_some()
            || self.get(provider_id, None, now_unix_ms).is_some()
    }

    pub fn get(
        &self,
        provider_id: i64,
        client_type: Option<ClientType>,
        now_unix_ms: i64,
    ) -> Option<Cooldown> {
        let entries = self.entries.lock().expect("cooldown map poisoned");
        let key = Key {
            provider_id,
            client_type,
        };
        entries
            .get(&key)
            .filter(|c| c.until_unix_ms > now_unix_ms)
            .copied()
    }

    /// Writes `cooldown` only if it extends the existing expiry
    /// (monotonic, §4.4/§8). Emits `cooldown_update` and write-throughs to
    /// the repository on an actual write.
    pub fn set_if_later(&self, cooldown: Cooldown) {
        let key = Key {
            provider_id: cooldown.provider_id,
            client_type: cooldown.client_type,
        };
        let wrote = {
            let mut entries = self.entries.lock().expect("cooldown map poisoned");
            match entries.get(&key) {
                Some(existing) if existing.until_unix_ms >= cooldown.until_unix_ms => false,
                _ => {
                    entries.insert(key, cooldown);
                    true
                }
            }
        };
        if !wrote {
            return;
        }
        self.events.publish(Event::CooldownUpdate(CooldownUpdate {
            provider_id: cooldown.provider_id,
            client_type: cooldown.client_type,
            until_unix_ms: cooldown.until_unix_ms,
        }));
        if self.write_through.try_send(cooldown).is_err() {
            tracing::warn!(
                provider_id = cooldown.provider_id,
                "cooldown write-through channel full or closed, dropping persistence write"
            );
        }
    }

    /// Removes every entry (specific and wildcard) for `provider_id`.
    pub fn clear(&self, provider_id: i64) {
        let mut entries = self.entries.lock().expect("cooldown map poisoned");
        entries.retain(|key, _| key.provider_id != provider_id);
    }

    /// Removes exactly the `(provider_id, client_type)` entry, leaving any
    /// sibling wildcard/specific entry for the same provider untouched.
    /// Used to reset the 5xx incremental streak on success without over-
    /// clearing an unrelated client type's cooldown (§4.3).
    pub fn clear_one(&self, provider_id: i64, client_type: Option<ClientType>) {
        let mut entries = self.entries.lock().expect("cooldown map poisoned");
        entries.remove(&Key {
            provider_id,
            client_type,
        });
    }

    /// Current 5xx streak for `(provider_id, client_type)`, ignoring
    /// expiry — the streak resets only on success, not on timer sweep
    /// (§4.3). Returns 0 if no entry or the entry isn't a server-error
    /// cooldown.
    pub fn incremental_count(&self, provider_id: i64, client_type: Option<ClientType>) -> u32 {
        let entries = self.entries.lock().expect("cooldown map poisoned");
        entries
            .get(&Key {
                provider_id,
                client_type,
            })
            .map(|cooldown| cooldown.incremental_count)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<Cooldown> {
        self.entries
            .lock()
            .expect("cooldown map poisoned")
            .values()
            .copied()
            .collect()
    }

    fn sweep(&self, now_unix_ms: i64) {
        let mut entries = self.entries.lock().expect("cooldown map poisoned");
        entries.retain(|_, cooldown| cooldown.until_unix_ms > now_unix_ms);
    }

    /// Runs forever, removing expired entries every `SWEEP_INTERVAL`. The
    /// caller spawns this as a background task at bootstrap.
    pub async fn run_sweeper(&self, now_unix_ms: impl Fn() -> i64) {
        let mut ticker = time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            self.sweep(now_unix_ms());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyroute_model::cooldown::CooldownCause;

    fn cooldown(provider_id: i64, client_type: Option<ClientType>, until_unix_ms: i64) -> Cooldown {
        Cooldown {
            provider_id,
            client_type,
            until_unix_ms,
            cause: CooldownCause::NetworkError,
            incremental_count: 0,
        }
    }

    #[tokio::test]
    async fn set_if_later_is_monotonic() {
        let (registry, _rx) = CooldownRegistry::new(EventHub::new());
        registry.set_if_later(cooldown(1, Some(ClientType::Claude), 100));
        registry.set_if_later(cooldown(1, Some(ClientType::Claude), 50));
        let stored = registry.get(1, Some(ClientType::Claude), 0).unwrap();
        assert_eq!(stored.until_unix_ms, 100);
        registry.set_if_later(cooldown(1, Some(ClientType::Claude), 200));
        let stored = registry.get(1, Some(ClientType::Claude), 0).unwrap();
        assert_eq!(stored.until_unix_ms, 200);
    }

    #[tokio::test]
    async fn wildcard_and_specific_entries_coexist() {
        let (registry, _rx) = CooldownRegistry::new(EventHub::new());
        registry.set_if_later(cooldown(1, None, 1_000));
        registry.set_if_later(cooldown(1, Some(ClientType::Gemini), 50));
        assert!(registry.is_cooling(1, ClientType::Gemini, 0));
        assert!(registry.is_cooling(1, ClientType::Claude, 0));
        assert!(registry.get(1, Some(ClientType::Gemini), 0).is_some());
        assert!(registry.get(1, None, 0).is_some());
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let (registry, _rx) = CooldownRegistry::new(EventHub::new());
        registry.set_if_later(cooldown(1, Some(ClientType::Claude), 100));
        assert!(registry.get(1, Some(ClientType::Claude), 0).is_some());
        assert!(registry.get(1, Some(ClientType::Claude), 200).is_none());
    }

    #[tokio::test]
    async fn clear_removes_all_client_types_for_provider() {
        let (registry, _rx) = CooldownRegistry::new(EventHub::new());
        registry.set_if_later(cooldown(1, Some(ClientType::Claude), 100));
        registry.set_if_later(cooldown(1, None, 100));
        registry.clear(1);
        assert!(registry.snapshot().is_empty());
    }
}
