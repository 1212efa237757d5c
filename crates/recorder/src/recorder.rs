//! The Recorder contract
//!
//! A recorder is the write side of a storage backend: it accepts rows, either
//! flattened ([`FlatRow`]) or tree-shaped ([`ExpressionValue`]), one at a time
//! or in batches.
//!
//! ## Ownership
//!
//! The required operations take their rows by value, so a backend may keep or
//! reuse the buffers without copying. The `*_ref` forms exist for callers that
//! must keep their rows; they clone and delegate, and a backend overriding
//! them must keep the results identical.
//!
//! ## Batches
//!
//! `record_rows` and `record_rows_expr` submit one logical transaction.
//! Within a batch, row order is the order duplicate-column and visibility
//! rules apply in. A backend that cannot make a batch all-or-nothing must say
//! so in its documentation and report which rows were written when it fails.
//!
//! ## Concurrency
//!
//! The trait does not serialize calls. Each backend documents whether
//! concurrent `record_row`/`record_rows` calls on one instance are safe.

use std::sync::Arc;

use strata_core::{
    CellValue, ColumnPath, ExpressionValue, FlatRow, RowPath, StrataResult, Timestamp,
};

use crate::specialize;

/// Schema-bound recording closure returned by
/// [`Recorder::specialize_record_tabular`]
///
/// Arguments are the row name, the timestamp shared by every cell, one value
/// per bound column (consumed), and extra `(column, value)` pairs for columns
/// outside the bound schema. Intended for a single writer.
pub type RecordTabular<'a> = Box<
    dyn FnMut(RowPath, Timestamp, Vec<CellValue>, Vec<(ColumnPath, CellValue)>) -> StrataResult<()>
        + Send
        + 'a,
>;

/// Capability set every storage backend implements to accept data
pub trait Recorder: Send + Sync {
    /// Kind of recorder, used in logs and error messages
    fn kind(&self) -> &str {
        "recorder"
    }

    /// Record one flattened row
    fn record_row(&self, row: FlatRow) -> StrataResult<()>;

    /// Record many flattened rows as one logical transaction
    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()>;

    /// Record one row given as a tree value
    ///
    /// Backends that store flat rows flatten internally, usually through
    /// [`defaults::record_row_expr_flattened`].
    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()>;

    /// Batch form of [`Recorder::record_row_expr`]
    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()>;

    /// Borrowing form of [`Recorder::record_row`]
    fn record_row_ref(&self, row: &FlatRow) -> StrataResult<()> {
        self.record_row(row.clone())
    }

    /// Borrowing form of [`Recorder::record_rows`]
    fn record_rows_ref(&self, rows: &[FlatRow]) -> StrataResult<()> {
        self.record_rows(rows.to_vec())
    }

    /// Borrowing form of [`Recorder::record_row_expr`]
    fn record_row_expr_ref(&self, row: &RowPath, expr: &ExpressionValue) -> StrataResult<()> {
        self.record_row_expr(row.clone(), expr.clone())
    }

    /// Borrowing form of [`Recorder::record_rows_expr`]
    fn record_rows_expr_ref(&self, rows: &[(RowPath, ExpressionValue)]) -> StrataResult<()> {
        self.record_rows_expr(rows.to_vec())
    }

    /// Bind a fixed column layout and return a positional recording closure
    ///
    /// The default builds a [`FlatRow`] per call and hands it to
    /// [`Recorder::record_row`]. Overrides must store exactly what the
    /// default would, including rejecting a wrong number of values.
    fn specialize_record_tabular(&self, columns: &[ColumnPath]) -> RecordTabular<'_> {
        specialize::specialize_default(self, columns)
    }

    /// Signal the end of a logically grouped burst of writes
    ///
    /// Backends may flush or checkpoint here. Not a durability guarantee.
    fn finished_chunk(&self) -> StrataResult<()> {
        Ok(())
    }

    /// Backend-defined diagnostic snapshot
    fn status(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

impl<R: Recorder + ?Sized> Recorder for Arc<R> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn record_row(&self, row: FlatRow) -> StrataResult<()> {
        (**self).record_row(row)
    }

    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        (**self).record_rows(rows)
    }

    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        (**self).record_row_expr(row, expr)
    }

    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        (**self).record_rows_expr(rows)
    }

    fn record_row_ref(&self, row: &FlatRow) -> StrataResult<()> {
        (**self).record_row_ref(row)
    }

    fn record_rows_ref(&self, rows: &[FlatRow]) -> StrataResult<()> {
        (**self).record_rows_ref(rows)
    }

    fn record_row_expr_ref(&self, row: &RowPath, expr: &ExpressionValue) -> StrataResult<()> {
        (**self).record_row_expr_ref(row, expr)
    }

    fn record_rows_expr_ref(&self, rows: &[(RowPath, ExpressionValue)]) -> StrataResult<()> {
        (**self).record_rows_expr_ref(rows)
    }

    fn specialize_record_tabular(&self, columns: &[ColumnPath]) -> RecordTabular<'_> {
        (**self).specialize_record_tabular(columns)
    }

    fn finished_chunk(&self) -> StrataResult<()> {
        (**self).finished_chunk()
    }

    fn status(&self) -> serde_json::Value {
        (**self).status()
    }
}

/// Default conversions between the two row shapes
///
/// Backends implement the required operations by delegating to whichever of
/// these matches their native shape. Pick one direction per backend: a
/// backend that forwards flat rows to tree rows and tree rows back to flat
/// rows recurses forever.
pub mod defaults {
    use super::Recorder;
    use strata_core::{ExpressionValue, FlatRow, RowPath, StrataResult};

    /// Flatten a tree row and submit it through `record_row`
    pub fn record_row_expr_flattened<R: Recorder + ?Sized>(
        recorder: &R,
        row: RowPath,
        expr: ExpressionValue,
    ) -> StrataResult<()> {
        recorder.record_row(FlatRow::from_expr(row, expr))
    }

    /// Flatten every tree row and submit them as one `record_rows` batch
    pub fn record_rows_expr_flattened<R: Recorder + ?Sized>(
        recorder: &R,
        rows: Vec<(RowPath, ExpressionValue)>,
    ) -> StrataResult<()> {
        let flat = rows
            .into_iter()
            .map(|(row, expr)| FlatRow::from_expr(row, expr))
            .collect();
        recorder.record_rows(flat)
    }

    /// Submit each row through `record_row`, in order, stopping at the first
    /// failure
    ///
    /// Rows before the failing one stay recorded, so a backend using this
    /// has best-effort batch semantics and must document it.
    pub fn record_rows_one_by_one<R: Recorder + ?Sized>(
        recorder: &R,
        rows: Vec<FlatRow>,
    ) -> StrataResult<()> {
        for row in rows {
            recorder.record_row(row)?;
        }
        Ok(())
    }

    /// Rebuild the tree form of a flat row and submit it through
    /// `record_row_expr`
    pub fn record_row_as_expr<R: Recorder + ?Sized>(
        recorder: &R,
        row: FlatRow,
    ) -> StrataResult<()> {
        let (name, expr) = row.into_expr()?;
        recorder.record_row_expr(name, expr)
    }

    /// Rebuild every flat row as a tree and submit them as one
    /// `record_rows_expr` batch
    ///
    /// Nothing is submitted if any row has no tree form.
    pub fn record_rows_as_expr<R: Recorder + ?Sized>(
        recorder: &R,
        rows: Vec<FlatRow>,
    ) -> StrataResult<()> {
        let exprs = rows
            .into_iter()
            .map(FlatRow::into_expr)
            .collect::<StrataResult<Vec<_>>>()?;
        recorder.record_rows_expr(exprs)
    }
}
