//! Shared helpers for the recorder suite

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use serde::Deserialize;
use serde_json::json;
use strata_ingest::{
    defaults, register_builtin_recorders, Cell, ExpressionValue, FlatRow, Path, ProgressReporter,
    Recorder, RecorderContext, RecorderKind, RecorderRegistration, RecorderRegistry, RowPath,
    StrataResult, Timestamp,
};

/// Package the test kinds register under
pub const TEST_PACKAGE: &str = "test";

/// Context over a fresh registry holding the built-in kinds plus `counting`
/// and `tree`
pub fn fresh_context() -> RecorderContext {
    let registry = RecorderRegistry::new();
    register_builtin_recorders(&registry).unwrap();
    RecorderRegistration::<CountingRecorder>::new(
        &registry,
        TEST_PACKAGE,
        "counting",
        "counts factory calls, stores nothing",
    )
    .unwrap();
    RecorderRegistration::<TreeRecorder>::new(&registry, TEST_PACKAGE, "tree", "stores trees")
        .unwrap();
    RecorderContext::new(Arc::new(registry))
}

pub fn ts(secs: u64) -> Timestamp {
    Timestamp::from_secs(secs)
}

pub fn flat(row: &str, cells: &[(&str, i64)], at: Timestamp) -> FlatRow {
    FlatRow::new(
        row,
        cells.iter().map(|(c, v)| Cell::new(*c, *v, at)).collect(),
    )
}

pub fn expect_err<T>(result: StrataResult<T>) -> strata_ingest::StrataError {
    match result {
        Err(e) => e,
        Ok(_) => panic!("expected an error"),
    }
}

// ============================================================================
// Counting kind
// ============================================================================

/// Number of times the `counting` factory ran in a context
#[derive(Debug, Default)]
pub struct FactoryCalls(pub AtomicUsize);

impl FactoryCalls {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountingConfig {
    pub label: String,
    /// Progress events reported after the initial one
    #[serde(default)]
    pub steps: usize,
}

pub struct CountingRecorder {
    pub label: String,
    rows: AtomicUsize,
}

impl Recorder for CountingRecorder {
    fn kind(&self) -> &str {
        "counting"
    }
    fn record_row(&self, _row: FlatRow) -> StrataResult<()> {
        self.rows.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        self.rows.fetch_add(rows.len(), Ordering::SeqCst);
        Ok(())
    }
    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        defaults::record_row_expr_flattened(self, row, expr)
    }
    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        defaults::record_rows_expr_flattened(self, rows)
    }
    fn status(&self) -> serde_json::Value {
        json!({ "label": self.label, "rows": self.rows.load(Ordering::SeqCst) })
    }
}

impl RecorderKind for CountingRecorder {
    type Config = CountingConfig;

    fn create(
        ctx: &RecorderContext,
        config: CountingConfig,
        progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self> {
        ctx.extension::<FactoryCalls>()?
            .0
            .fetch_add(1, Ordering::SeqCst);
        for step in 0..config.steps {
            progress.report(json!({ "step": step + 1, "of": config.steps }))?;
        }
        Ok(CountingRecorder {
            label: config.label,
            rows: AtomicUsize::new(0),
        })
    }

    fn attach_logger(&mut self, _span: tracing::Span) {}
}

// ============================================================================
// Tree-native kind
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeConfig {}

/// Backend whose native shape is the tree; flat rows are rebuilt as trees
#[derive(Default)]
pub struct TreeRecorder {
    pub rows: Mutex<Vec<(RowPath, ExpressionValue)>>,
}

impl Recorder for TreeRecorder {
    fn record_row(&self, row: FlatRow) -> StrataResult<()> {
        defaults::record_row_as_expr(self, row)
    }
    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        defaults::record_rows_as_expr(self, rows)
    }
    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        self.rows.lock().push((row, expr));
        Ok(())
    }
    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        self.rows.lock().extend(rows);
        Ok(())
    }
    fn status(&self) -> serde_json::Value {
        json!({ "rows": self.rows.lock().len() })
    }
}

impl RecorderKind for TreeRecorder {
    type Config = TreeConfig;

    fn create(
        _ctx: &RecorderContext,
        _config: TreeConfig,
        _progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self> {
        Ok(TreeRecorder::default())
    }

    fn attach_logger(&mut self, _span: tracing::Span) {}
}

// ============================================================================
// Strategies
// ============================================================================

pub mod strategies {
    use super::*;

    /// Flat rows over a small name space so rows and columns repeat
    pub fn flat_rows() -> impl Strategy<Value = Vec<FlatRow>> {
        proptest::collection::vec(
            (
                "[a-d]",
                proptest::collection::vec(("[p-s]", any::<i64>(), 0u64..1_000), 0..5),
            ),
            0..16,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(row, cells)| {
                    FlatRow::new(
                        row.as_str(),
                        cells
                            .into_iter()
                            .map(|(c, v, micros)| {
                                Cell::new(c.as_str(), v, Timestamp::from_micros(micros))
                            })
                            .collect(),
                    )
                })
                .collect()
        })
    }

    /// Tree rows of bounded depth
    pub fn expr_rows() -> impl Strategy<Value = Vec<(RowPath, ExpressionValue)>> {
        let leaf = (any::<i64>(), 0u64..1_000)
            .prop_map(|(v, micros)| ExpressionValue::atom(v, Timestamp::from_micros(micros)));
        let tree = leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(ExpressionValue::array),
                proptest::collection::vec(("[k-n]", inner), 0..4)
                    .prop_map(ExpressionValue::object),
            ]
        });
        proptest::collection::vec(("[a-d]".prop_map(|r| Path::new(r.as_str())), tree), 0..8)
    }
}

// ============================================================================
// Concurrency
// ============================================================================

pub mod concurrent {
    use std::sync::{Arc, Barrier};
    use std::thread::{self, JoinHandle};

    /// Run multiple threads that start at the same time
    pub fn run_concurrent<F, T>(num_threads: usize, f: F) -> Vec<T>
    where
        F: Fn(usize) -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        let barrier = Arc::new(Barrier::new(num_threads));
        let f = Arc::new(f);

        let handles: Vec<JoinHandle<T>> = (0..num_threads)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let f = Arc::clone(&f);
                thread::spawn(move || {
                    barrier.wait();
                    f(i)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("Thread panicked"))
            .collect()
    }
}
