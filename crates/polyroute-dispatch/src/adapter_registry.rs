//! Resolves the `Adapter` for one (client wire format, provider type) pair
//! (§4.2). Registration happens once at bootstrap; lookups are hot-path.

use std::collections::HashMap;
use std::sync::Arc;

use polyroute_adapter::Adapter;
use polyroute_common::ClientType;
use polyroute_model::provider::ProviderType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    client_type: ClientType,
    provider_type: ProviderType,
}

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Key, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client_type: ClientType, provider_type: ProviderType, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(Key { client_type, provider_type }, adapter);
    }

    pub fn resolve(&self, client_type: ClientType, provider_type: ProviderType) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(&Key { client_type, provider_type }).cloned()
    }
}
