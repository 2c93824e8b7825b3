//! Floor-plan collection persistence
//!
//! The full collection is serialized as one JSON array under one key. Reads
//! never fail: a missing, unreadable or corrupt entry loads as empty.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{KeyValueStore, StoreError};
use crate::domain::FloorPlan;

/// Typed view of a [`KeyValueStore`] holding floor-plan collections
#[derive(Clone)]
pub struct PlanStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PlanStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load the collection stored under `key`
    ///
    /// Returns an empty collection when the key is missing or the stored
    /// content cannot be read or decoded.
    pub async fn load(&self, key: &str) -> Vec<FloorPlan> {
        debug!(%key, "PlanStore::load: called");
        let content = match self.backend.load(key).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("PlanStore::load: nothing stored");
                return Vec::new();
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to read stored floor plans");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<FloorPlan>>(&content) {
            Ok(plans) => {
                debug!(count = plans.len(), "PlanStore::load: decoded");
                plans
            }
            Err(e) => {
                warn!(%key, error = %e, "Stored floor plans are corrupt, ignoring");
                Vec::new()
            }
        }
    }

    /// Replace the collection stored under `key`
    pub async fn store(&self, key: &str, plans: &[FloorPlan]) -> Result<(), StoreError> {
        debug!(%key, count = plans.len(), "PlanStore::store: called");
        let content = serde_json::to_string(plans)?;
        self.backend.store(key, &content).await
    }
}

impl std::fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanStore").finish_non_exhaustive()
    }
}
