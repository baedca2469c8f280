//! Persistence seam for the bulk loader
//!
//! The loader only needs two things from storage: how many entities of a kind
//! exist, and a way to write a batch. [`SqliteStore`] is the production
//! implementation; tests substitute in-memory recorders.

use crate::db;
use async_trait::async_trait;
use marquee_common::{EntityKind, EntityRecord, Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Number of stored entities of `kind`
    async fn count(&self, kind: EntityKind) -> Result<i64>;

    /// Persist a batch of records of `kind` as one unit
    ///
    /// Records with a natural key replace the stored entity with that key.
    async fn bulk_upsert(&self, kind: EntityKind, records: Vec<EntityRecord>) -> Result<()>;
}

/// SQLite-backed store: one transaction per batch
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn count(&self, kind: EntityKind) -> Result<i64> {
        db::count_rows(&self.pool, kind).await
    }

    async fn bulk_upsert(&self, kind: EntityKind, records: Vec<EntityRecord>) -> Result<()> {
        if let Some(stray) = records.iter().find(|r| r.kind() != kind) {
            return Err(Error::InvalidInput(format!(
                "{} record in a {} batch",
                stray.kind(),
                kind
            )));
        }

        let mut tx = self.pool.begin().await?;
        for record in &records {
            db::write_record(&mut *tx, record).await?;
        }
        tx.commit().await?;

        debug!(kind = %kind, records = records.len(), "Committed batch");
        Ok(())
    }
}
