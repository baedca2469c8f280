//! Startup bulk population
//!
//! [`BulkLoader::populate_if_empty`] checks the gate, then streams each
//! dataset in the fixed order: decode rows, group them into batches, map each
//! row to a record, write each batch. Malformed rows are skipped and counted;
//! anything else stops the run.
//!
//! Decoding reads straight from the archive on the calling task, so the
//! returned futures are not `Send`. Run them on the startup task rather than
//! spawning them.

use crate::batcher::BatchExt;
use crate::error::{LoadError, LoadResult};
use crate::mapper::map_row;
use crate::store::EntityStore;
use crate::xlsx::Workbook;
use chrono::{DateTime, Utc};
use marquee_common::config::{GatePolicy, IngestConfig, ResolvedConfig, DEFAULT_BATCH_SIZE};
use marquee_common::EntityKind;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// One dataset export to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub kind: EntityKind,
    pub path: PathBuf,
}

impl Dataset {
    pub fn new(kind: EntityKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// All five datasets at their configured locations, in load order
    pub fn standard_set(config: &ResolvedConfig) -> Vec<Dataset> {
        EntityKind::LOAD_ORDER
            .iter()
            .map(|&kind| Dataset::new(kind, config.dataset_path(kind)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: NonZeroUsize,
    pub gate: GatePolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            gate: GatePolicy::default(),
        }
    }
}

impl LoaderOptions {
    pub fn from_config(ingest: &IngestConfig) -> LoadResult<Self> {
        let batch_size = NonZeroUsize::new(ingest.batch_size).ok_or_else(|| {
            LoadError::InvalidConfig("batch size must be at least 1".to_string())
        })?;
        Ok(Self {
            batch_size,
            gate: ingest.gate,
        })
    }
}

/// Counters for one loaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetReport {
    pub kind: EntityKind,
    pub path: PathBuf,
    /// Worksheet part that was decoded, if the package had one
    pub sheet: Option<String>,
    /// Data rows decoded (header excluded)
    pub rows_read: u64,
    pub records_written: u64,
    /// Rows dropped because they could not be mapped
    pub rows_skipped: u64,
    /// Bulk writes issued
    pub batches: u64,
}

impl DatasetReport {
    fn new(dataset: &Dataset) -> Self {
        Self {
            kind: dataset.kind,
            path: dataset.path.clone(),
            sheet: None,
            rows_read: 0,
            records_written: 0,
            rows_skipped: 0,
            batches: 0,
        }
    }
}

/// Result of a completed population run
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub datasets: Vec<DatasetReport>,
    /// Datasets left alone because their table already had rows
    pub skipped: Vec<EntityKind>,
}

impl LoadSummary {
    pub fn records_written(&self) -> u64 {
        self.datasets.iter().map(|d| d.records_written).sum()
    }

    pub fn rows_skipped(&self) -> u64 {
        self.datasets.iter().map(|d| d.rows_skipped).sum()
    }

    pub fn dataset(&self, kind: EntityKind) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.kind == kind)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum PopulationOutcome {
    /// Gate was closed; nothing was decoded or written
    AlreadyPopulated { movie_count: i64 },
    Loaded(LoadSummary),
}

pub struct BulkLoader<S> {
    store: S,
    datasets: Vec<Dataset>,
    options: LoaderOptions,
}

impl<S: EntityStore> BulkLoader<S> {
    /// Datasets are processed in load order regardless of the order given
    pub fn new(store: S, mut datasets: Vec<Dataset>, options: LoaderOptions) -> Self {
        datasets.sort_by_key(|d| load_position(d.kind));
        Self {
            store,
            datasets,
            options,
        }
    }

    pub fn from_config(store: S, config: &ResolvedConfig) -> LoadResult<Self> {
        let options = LoaderOptions::from_config(&config.ingest)?;
        Ok(Self::new(store, Dataset::standard_set(config), options))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Load every dataset unless the catalog already holds data
    pub async fn populate_if_empty(&self) -> LoadResult<PopulationOutcome> {
        let movie_count = self.store.count(EntityKind::Movie).await?;
        if self.options.gate == GatePolicy::PrimaryOnly && movie_count > 0 {
            info!(movie_count, "Catalog already populated, skipping bulk load");
            return Ok(PopulationOutcome::AlreadyPopulated { movie_count });
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            datasets = self.datasets.len(),
            batch_size = self.options.batch_size.get(),
            gate = ?self.options.gate,
            "Starting bulk load"
        );

        let mut reports = Vec::with_capacity(self.datasets.len());
        let mut skipped = Vec::new();

        for dataset in &self.datasets {
            if self.options.gate == GatePolicy::PerDataset {
                let existing = match dataset.kind {
                    EntityKind::Movie => movie_count,
                    kind => self.store.count(kind).await?,
                };
                if existing > 0 {
                    info!(kind = %dataset.kind, existing, "Dataset already loaded, skipping");
                    skipped.push(dataset.kind);
                    continue;
                }
            }

            let span = info_span!("dataset", kind = %dataset.kind, %run_id);
            let report = self.load_dataset(dataset).instrument(span).await?;
            reports.push(report);
        }

        if reports.is_empty() && !skipped.is_empty() {
            info!(movie_count, "Every dataset already loaded");
            return Ok(PopulationOutcome::AlreadyPopulated { movie_count });
        }

        let summary = LoadSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            datasets: reports,
            skipped,
        };
        info!(
            %run_id,
            records = summary.records_written(),
            skipped_rows = summary.rows_skipped(),
            elapsed_ms = summary.elapsed_ms(),
            "Bulk load complete"
        );

        Ok(PopulationOutcome::Loaded(summary))
    }

    /// Stream one dataset into the store
    pub async fn load_dataset(&self, dataset: &Dataset) -> LoadResult<DatasetReport> {
        let kind = dataset.kind;
        let file = File::open(&dataset.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::ResourceNotFound {
                kind,
                path: dataset.path.clone(),
            },
            _ => LoadError::decode(kind, &dataset.path, e.into()),
        })?;

        let mut workbook = Workbook::new(BufReader::new(file))
            .map_err(|e| LoadError::decode(kind, &dataset.path, e))?;

        let mut report = DatasetReport::new(dataset);
        report.sheet = workbook.sheet_part().map(str::to_string);

        let rows = workbook
            .first_sheet_rows()
            .map_err(|e| LoadError::decode(kind, &dataset.path, e))?;
        let Some(rows) = rows else {
            warn!(path = %dataset.path.display(), "Dataset has no readable sheet, nothing loaded");
            return Ok(report);
        };

        for batch in rows.batched(self.options.batch_size) {
            let batch = batch.map_err(|e| LoadError::decode(kind, &dataset.path, e))?;

            let mut records = Vec::with_capacity(batch.len());
            for row in &batch {
                report.rows_read += 1;
                match map_row(kind, row) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        report.rows_skipped += 1;
                        // Sheet row number: the header occupies row 1
                        debug!(row = report.rows_read + 1, error = %e, "Skipping malformed row");
                    }
                }
            }
            drop(batch);

            if records.is_empty() {
                continue;
            }

            let written = records.len() as u64;
            self.store.bulk_upsert(kind, records).await?;
            report.records_written += written;
            report.batches += 1;
            debug!(batch = report.batches, records = written, "Batch written");
        }

        if report.rows_skipped > 0 {
            warn!(skipped = report.rows_skipped, "Skipped malformed rows");
        }
        info!(
            rows = report.rows_read,
            records = report.records_written,
            batches = report.batches,
            "Dataset loaded"
        );

        Ok(report)
    }
}

fn load_position(kind: EntityKind) -> usize {
    EntityKind::LOAD_ORDER
        .iter()
        .position(|&k| k == kind)
        .unwrap_or(EntityKind::LOAD_ORDER.len())
}
