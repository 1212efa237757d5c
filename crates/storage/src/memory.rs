//! In-memory recorder backend
//!
//! Rows land in a [`MemoryDataset`]: an ordered map from row path to that
//! row's columns. Datasets are named and live in the [`MemoryDatasets`]
//! extension of a `RecorderContext`, so every memory recorder configured
//! with the same dataset name in one context writes to the same rows.
//!
//! # Semantics
//!
//! - Duplicate columns: last write wins, in application order. Within a
//!   row, cells apply left to right; within a batch, rows apply in order.
//!   Cell timestamps are stored but do not decide the winner.
//! - Batches are all-or-nothing: a batch is applied under one write lock,
//!   and a batch that would push the dataset past `max_rows` is rejected
//!   whole before anything is written.
//! - Concurrent `record_*` calls on one recorder, or on several recorders
//!   sharing a dataset, are safe.
//!
//! # Design
//!
//! - BTreeMap: rows are kept sorted by path for ordered snapshots
//! - FxHashMap: O(1) column lookups within a row

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strata_core::{
    Cell, CellValue, ColumnPath, ExpressionValue, FlatRow, RowPath, StrataError, StrataResult,
    Timestamp,
};
use strata_recorder::specialize::check_arity;
use strata_recorder::{defaults, ProgressReporter, RecordTabular, Recorder, RecorderContext, RecorderKind};
use tracing::debug;

/// Kind name the memory backend registers under
pub const MEMORY_KIND: &str = "memory";

/// Columns of one stored row
type Columns = FxHashMap<ColumnPath, (CellValue, Timestamp)>;

/// A named set of rows held in memory
#[derive(Debug)]
pub struct MemoryDataset {
    name: String,
    rows: RwLock<BTreeMap<RowPath, Columns>>,
    chunks: AtomicU64,
}

impl MemoryDataset {
    /// Create an empty dataset
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDataset {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
            chunks: AtomicU64::new(0),
        }
    }

    /// Dataset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of distinct rows
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Number of stored cells across all rows
    pub fn cell_count(&self) -> usize {
        self.rows.read().values().map(|c| c.len()).sum()
    }

    /// Number of finished chunks
    pub fn chunks(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }

    /// Check if a row exists
    pub fn contains_row(&self, row: &RowPath) -> bool {
        self.rows.read().contains_key(row)
    }

    /// Current value and timestamp of one cell
    pub fn get(&self, row: &RowPath, column: &ColumnPath) -> Option<(CellValue, Timestamp)> {
        self.rows
            .read()
            .get(row)
            .and_then(|columns| columns.get(column))
            .cloned()
    }

    /// One row's cells, sorted by column
    pub fn row(&self, row: &RowPath) -> Option<FlatRow> {
        self.rows
            .read()
            .get(row)
            .map(|columns| to_flat_row(row, columns))
    }

    /// Every row, sorted by path, with cells sorted by column
    pub fn snapshot(&self) -> Vec<FlatRow> {
        self.rows
            .read()
            .iter()
            .map(|(row, columns)| to_flat_row(row, columns))
            .collect()
    }

    /// One row as a tree value, `Ok(None)` when the row is absent
    pub fn row_expr(&self, row: &RowPath) -> StrataResult<Option<ExpressionValue>> {
        self.row(row)
            .map(|flat| ExpressionValue::from_cells(flat.columns))
            .transpose()
    }

    /// Drop every row
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Apply `rows` in order under one write lock
    ///
    /// Nothing is written if the batch would exceed `max_rows`.
    pub fn apply(&self, rows: Vec<FlatRow>, max_rows: Option<usize>) -> StrataResult<()> {
        let mut stored = self.rows.write();
        if let Some(limit) = max_rows {
            let new_rows: BTreeSet<&RowPath> = rows
                .iter()
                .map(|r| &r.row)
                .filter(|r| !stored.contains_key(*r))
                .collect();
            self.check_limit(stored.len() + new_rows.len(), limit)?;
        }
        for flat in rows {
            let columns = stored.entry(flat.row).or_default();
            for Cell { column, value, ts } in flat.columns {
                columns.insert(column, (value, ts));
            }
        }
        Ok(())
    }

    /// Write one tabular row without building an intermediate `FlatRow`
    pub fn apply_tabular(
        &self,
        columns: &[ColumnPath],
        row: RowPath,
        ts: Timestamp,
        values: Vec<CellValue>,
        extra: Vec<(ColumnPath, CellValue)>,
        max_rows: Option<usize>,
    ) -> StrataResult<()> {
        check_arity(columns.len(), values.len())?;
        let mut stored = self.rows.write();
        if let Some(limit) = max_rows {
            if !stored.contains_key(&row) {
                self.check_limit(stored.len() + 1, limit)?;
            }
        }
        let target = stored.entry(row).or_default();
        for (column, value) in columns.iter().zip(values) {
            target.insert(column.clone(), (value, ts));
        }
        for (column, value) in extra {
            target.insert(column, (value, ts));
        }
        Ok(())
    }

    fn check_limit(&self, wanted: usize, limit: usize) -> StrataResult<()> {
        if wanted > limit {
            return Err(StrataError::recording(
                MEMORY_KIND,
                format!(
                    "dataset '{}' is limited to {} rows, batch needs {}",
                    self.name, limit, wanted
                ),
            ));
        }
        Ok(())
    }

    fn finish_chunk(&self) -> u64 {
        self.chunks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn to_flat_row(row: &RowPath, columns: &Columns) -> FlatRow {
    let mut cells: Vec<Cell> = columns
        .iter()
        .map(|(column, (value, ts))| Cell::new(column.clone(), value.clone(), *ts))
        .collect();
    cells.sort_by(|a, b| a.column.cmp(&b.column));
    FlatRow::new(row.clone(), cells)
}

/// Named memory datasets of one context
///
/// Lives in `RecorderContext::extension`.
#[derive(Debug, Default)]
pub struct MemoryDatasets {
    datasets: DashMap<String, Arc<MemoryDataset>>,
}

impl MemoryDatasets {
    /// Get or create the dataset called `name`
    pub fn dataset(&self, name: &str) -> Arc<MemoryDataset> {
        self.datasets
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryDataset::new(name)))
            .value()
            .clone()
    }

    /// Existing dataset called `name`
    pub fn get(&self, name: &str) -> Option<Arc<MemoryDataset>> {
        self.datasets.get(name).map(|d| d.value().clone())
    }

    /// Dataset names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.datasets.iter().map(|d| d.key().clone()).collect();
        names.sort();
        names
    }
}

/// Parameters of the memory backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Dataset to write to
    pub dataset: String,
    /// Upper bound on distinct rows in the dataset
    #[serde(default)]
    pub max_rows: Option<usize>,
}

/// Recorder writing into a shared [`MemoryDataset`]
pub struct MemoryRecorder {
    dataset: Arc<MemoryDataset>,
    max_rows: Option<usize>,
    span: tracing::Span,
}

impl MemoryRecorder {
    /// Recorder over an existing dataset
    pub fn new(dataset: Arc<MemoryDataset>, max_rows: Option<usize>) -> Self {
        MemoryRecorder {
            dataset,
            max_rows,
            span: tracing::Span::none(),
        }
    }

    /// Dataset this recorder writes to
    pub fn dataset(&self) -> &Arc<MemoryDataset> {
        &self.dataset
    }
}

impl Recorder for MemoryRecorder {
    fn kind(&self) -> &str {
        MEMORY_KIND
    }

    fn record_row(&self, row: FlatRow) -> StrataResult<()> {
        self.dataset.apply(vec![row], self.max_rows)
    }

    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        let count = rows.len();
        self.dataset.apply(rows, self.max_rows)?;
        debug!(parent: &self.span, rows = count, "Recorded batch");
        Ok(())
    }

    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        defaults::record_row_expr_flattened(self, row, expr)
    }

    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        defaults::record_rows_expr_flattened(self, rows)
    }

    fn specialize_record_tabular(&self, columns: &[ColumnPath]) -> RecordTabular<'_> {
        let columns: Arc<[ColumnPath]> = columns.into();
        Box::new(move |row, ts, values, extra| {
            self.dataset
                .apply_tabular(&columns, row, ts, values, extra, self.max_rows)
        })
    }

    fn finished_chunk(&self) -> StrataResult<()> {
        let chunks = self.dataset.finish_chunk();
        debug!(parent: &self.span, chunks, "Finished chunk");
        Ok(())
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "dataset": self.dataset.name(),
            "rows": self.dataset.row_count(),
            "cells": self.dataset.cell_count(),
            "chunks": self.dataset.chunks(),
        })
    }
}

impl RecorderKind for MemoryRecorder {
    type Config = MemoryConfig;

    fn create(
        ctx: &RecorderContext,
        config: MemoryConfig,
        progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self> {
        if config.dataset.is_empty() {
            return Err(StrataError::config_validation(
                MEMORY_KIND,
                "dataset name must not be empty",
            ));
        }
        let datasets = ctx.extension::<MemoryDatasets>()?;
        let dataset = datasets.dataset(&config.dataset);
        progress.report(json!({
            "stage": "dataset",
            "dataset": config.dataset,
            "rows": dataset.row_count(),
        }))?;
        Ok(MemoryRecorder::new(dataset, config.max_rows))
    }

    fn attach_logger(&mut self, span: tracing::Span) {
        self.span = span;
    }
}
