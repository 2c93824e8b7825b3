//! Store test doubles

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{KeyValueStore, MemoryStore, StoreError};

/// Memory store whose reads and writes can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failed_writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

fn unavailable() -> StoreError {
    StoreError::Io(std::io::Error::other("storage unavailable"))
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            self.failed_writes.fetch_add(1, Ordering::SeqCst);
            return Err(unavailable());
        }
        self.inner.store(key, value).await
    }
}

/// Memory store whose first write waits until the gate is notified
#[derive(Debug)]
pub struct GatedStore {
    inner: MemoryStore,
    gate: Arc<Notify>,
    first_write_seen: AtomicBool,
}

impl GatedStore {
    pub fn new(gate: Arc<Notify>) -> Self {
        Self {
            inner: MemoryStore::new(),
            gate,
            first_write_seen: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if !self.first_write_seen.swap(true, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.inner.store(key, value).await
    }
}
