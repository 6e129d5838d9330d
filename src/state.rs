use std::sync::Arc;

use crate::{registry::SensorRegistry, store::SensorLogStore};

/// Everything sessions share
#[derive(Debug)]
pub struct TelemetryState {
    pub registry: SensorRegistry,
    pub store: SensorLogStore,
}

impl TelemetryState {
    /// Starts with an empty registry, whatever is already in the store
    pub fn new(store: SensorLogStore) -> Arc<Self> {
        Arc::new(Self {
            registry: SensorRegistry::new(),
            store,
        })
    }
}
