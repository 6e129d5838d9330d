use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::record::SensorId;

/// Sensors ingested since startup. Only these can be queried; log files left
/// by an earlier run don't count until the sensor is ingested again.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: RwLock<HashSet<SensorId>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the sensor was not registered before
    pub async fn register(&self, id: SensorId) -> bool {
        if self.contains(&id).await {
            return false;
        }
        self.sensors.write().await.insert(id)
    }

    pub async fn contains(&self, id: &SensorId) -> bool {
        self.sensors.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.sensors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sensors.read().await.is_empty()
    }
}
