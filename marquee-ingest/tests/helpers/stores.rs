//! In-memory stores for loader tests

use async_trait::async_trait;
use marquee_common::{EntityKind, EntityRecord, Error, Result};
use marquee_ingest::EntityStore;
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps every written record and the size of every batch
#[derive(Default)]
pub struct RecordingStore {
    existing: HashMap<EntityKind, i64>,
    batches: Mutex<Vec<(EntityKind, usize)>>,
    records: Mutex<Vec<EntityRecord>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `count` entities of `kind` are already stored
    pub fn with_existing(mut self, kind: EntityKind, count: i64) -> Self {
        self.existing.insert(kind, count);
        self
    }

    pub fn batch_sizes(&self, kind: EntityKind) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, size)| *size)
            .collect()
    }

    pub fn upsert_calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<EntityRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn written(&self, kind: EntityKind) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }
}

#[async_trait]
impl EntityStore for RecordingStore {
    async fn count(&self, kind: EntityKind) -> Result<i64> {
        let existing = self.existing.get(&kind).copied().unwrap_or(0);
        Ok(existing + self.written(kind) as i64)
    }

    async fn bulk_upsert(&self, kind: EntityKind, records: Vec<EntityRecord>) -> Result<()> {
        self.batches.lock().unwrap().push((kind, records.len()));
        self.records.lock().unwrap().extend(records);
        Ok(())
    }
}

/// Counts succeed; every write fails
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl EntityStore for FailingStore {
    async fn count(&self, _kind: EntityKind) -> Result<i64> {
        Ok(0)
    }

    async fn bulk_upsert(&self, _kind: EntityKind, _records: Vec<EntityRecord>) -> Result<()> {
        Err(Error::Io(std::io::Error::other("disk full")))
    }
}
