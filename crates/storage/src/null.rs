//! Recorder that discards everything
//!
//! Counts what it is given. Useful as a sink when benchmarking producers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::json;
use strata_core::{ExpressionValue, FlatRow, RowPath, StrataResult};
use strata_recorder::{ProgressReporter, Recorder, RecorderContext, RecorderKind};

/// Kind name the null backend registers under
pub const NULL_KIND: &str = "null";

/// The null backend takes no parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NullConfig {}

/// Recorder discarding rows
#[derive(Debug, Default)]
pub struct NullRecorder {
    rows: AtomicU64,
    cells: AtomicU64,
    chunks: AtomicU64,
}

impl NullRecorder {
    /// Create a new null recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows discarded so far
    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    /// Cells discarded so far
    pub fn cells(&self) -> u64 {
        self.cells.load(Ordering::Relaxed)
    }

    fn count(&self, rows: u64, cells: u64) {
        self.rows.fetch_add(rows, Ordering::Relaxed);
        self.cells.fetch_add(cells, Ordering::Relaxed);
    }
}

impl Recorder for NullRecorder {
    fn kind(&self) -> &str {
        NULL_KIND
    }

    fn record_row(&self, row: FlatRow) -> StrataResult<()> {
        self.count(1, row.column_count() as u64);
        Ok(())
    }

    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        let cells: usize = rows.iter().map(FlatRow::column_count).sum();
        self.count(rows.len() as u64, cells as u64);
        Ok(())
    }

    // Counting leaves does not need a flattened copy
    fn record_row_expr(&self, _row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        self.count(1, expr.leaf_count() as u64);
        Ok(())
    }

    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        let cells: usize = rows.iter().map(|(_, expr)| expr.leaf_count()).sum();
        self.count(rows.len() as u64, cells as u64);
        Ok(())
    }

    fn record_row_expr_ref(&self, _row: &RowPath, expr: &ExpressionValue) -> StrataResult<()> {
        self.count(1, expr.leaf_count() as u64);
        Ok(())
    }

    fn finished_chunk(&self) -> StrataResult<()> {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "rows": self.rows(),
            "cells": self.cells(),
            "chunks": self.chunks.load(Ordering::Relaxed),
        })
    }
}

impl RecorderKind for NullRecorder {
    type Config = NullConfig;

    fn create(
        _ctx: &RecorderContext,
        _config: NullConfig,
        _progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self> {
        Ok(NullRecorder::new())
    }

    fn attach_logger(&mut self, _span: tracing::Span) {}
}
