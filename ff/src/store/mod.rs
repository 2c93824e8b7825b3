//! Local durable store
//!
//! A key-value capability ([`KeyValueStore`]) with file-backed and in-memory
//! implementations, and [`PlanStore`], which keeps the whole floor-plan
//! collection under a single key.

mod error;
mod file;
mod memory;
#[cfg(test)]
pub mod mock;
mod plans;

use async_trait::async_trait;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use plans::PlanStore;

/// Default key the floor-plan collection is stored under
pub const DEFAULT_PLANS_KEY: &str = "floorPlans";

/// String key-value storage that survives restarts
///
/// Writes replace the previous value for the key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, `None` if it was never written
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`
    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Keys double as file names, so only a conservative character set is allowed
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
