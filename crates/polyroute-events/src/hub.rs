//! Non-blocking typed fanout (§4.8). Each subscriber owns a bounded
//! ring buffer; a full buffer drops its oldest entry and bumps a
//! counter rather than making the publisher wait.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::event::Event;

const DEFAULT_CAPACITY: usize = 256;

struct Channel {
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl Channel {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    fn push(&self, event: Event) {
        let mut queue = self.queue.lock().expect("event queue poisoned");
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
    }

    async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.queue.lock().expect("event queue poisoned").pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<u64, Arc<Channel>>,
}

/// Live subscription. Dropping it unregisters the subscriber from the hub.
pub struct Subscription {
    id: u64,
    channel: Arc<Channel>,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    pub async fn recv(&self) -> Event {
        self.channel.recv().await
    }

    /// Number of events dropped from this subscriber's queue due to
    /// overflow since subscription started.
    pub fn dropped_count(&self) -> u64 {
        self.channel.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry
            .lock()
            .expect("event registry poisoned")
            .channels
            .remove(&self.id);
    }
}

/// Typed event broadcaster (§4.8). Cheap to clone; all clones share the
/// same subscriber registry.
#[derive(Clone)]
pub struct EventHub {
    registry: Arc<Mutex<Registry>>,
    capacity: usize,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            capacity,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let mut registry = self.registry.lock().expect("event registry poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        let channel = Arc::new(Channel::new(self.capacity));
        registry.channels.insert(id, channel.clone());
        drop(registry);
        Subscription {
            id,
            channel,
            registry: self.registry.clone(),
        }
    }

    /// Fans `event` out to every current subscriber. Never blocks and
    /// never awaits a subscriber's consumption rate.
    pub fn publish(&self, event: Event) {
        let registry = self.registry.lock().expect("event registry poisoned");
        for channel in registry.channels.values() {
            channel.push(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().expect("event registry poisoned").channels.len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_published_event_to_subscriber() {
        let hub = EventHub::new();
        let sub = hub.subscribe();
        hub.publish(Event::ServerStarted);
        let event = sub.recv().await;
        assert_eq!(event.name(), "server-started");
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts() {
        let hub = EventHub::with_capacity(2);
        let sub = hub.subscribe();
        hub.publish(Event::ServerStarted);
        hub.publish(Event::ServerStarted);
        hub.publish(Event::ServerStopped);
        assert_eq!(sub.dropped_count(), 1);
        let first = sub.recv().await;
        assert_eq!(first.name(), "server-started");
        let second = sub.recv().await;
        assert_eq!(second.name(), "server-stopped");
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_it() {
        let hub = EventHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn ordering_preserved_per_subscriber() {
        let hub = EventHub::with_capacity(8);
        let sub = hub.subscribe();
        hub.publish(Event::ServerStarted);
        hub.publish(Event::ServerStopped);
        assert_eq!(sub.recv().await.name(), "server-started");
        assert_eq!(sub.recv().await.name(), "server-stopped");
    }
}
