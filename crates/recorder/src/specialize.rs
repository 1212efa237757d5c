//! Tabular specialization
//!
//! Producers that write many rows with the same column layout bind the
//! layout once and then pass values positionally. Calling the bound closure
//! with `values = [v0, .., vn]` records the same row as
//! `record_row` with cells `[(c0, v0, ts), .., (cn, vn, ts)]` followed by the
//! `extra` pairs, all stamped with `ts`.
//!
//! The number of values is checked on every call. A mismatch fails with
//! [`StrataError::ArityMismatch`] and records nothing.

use std::sync::Arc;

use strata_core::{Cell, CellValue, ColumnPath, FlatRow, RowPath, StrataError, StrataResult, Timestamp};

use crate::recorder::{RecordTabular, Recorder};

/// Fail unless `actual` values were passed for `expected` bound columns
#[inline]
pub fn check_arity(expected: usize, actual: usize) -> StrataResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(StrataError::ArityMismatch { expected, actual })
    }
}

/// Build the flat row a tabular call stands for
pub fn build_tabular_row(
    columns: &[ColumnPath],
    row: RowPath,
    ts: Timestamp,
    values: Vec<CellValue>,
    extra: Vec<(ColumnPath, CellValue)>,
) -> StrataResult<FlatRow> {
    check_arity(columns.len(), values.len())?;

    let mut cells = Vec::with_capacity(columns.len() + extra.len());
    cells.extend(
        columns
            .iter()
            .zip(values)
            .map(|(column, value)| Cell {
                column: column.clone(),
                value,
                ts,
            }),
    );
    cells.extend(
        extra
            .into_iter()
            .map(|(column, value)| Cell { column, value, ts }),
    );
    Ok(FlatRow { row, columns: cells })
}

/// Record one tabular row through the recorder's owned `record_row`
pub fn record_tabular<R: Recorder + ?Sized>(
    recorder: &R,
    columns: &[ColumnPath],
    row: RowPath,
    ts: Timestamp,
    values: Vec<CellValue>,
    extra: Vec<(ColumnPath, CellValue)>,
) -> StrataResult<()> {
    let flat = build_tabular_row(columns, row, ts, values, extra)?;
    recorder.record_row(flat)
}

/// Default specialization: a closure over the column list that calls
/// [`record_tabular`]
pub fn specialize_default<'a, R: Recorder + ?Sized>(
    recorder: &'a R,
    columns: &[ColumnPath],
) -> RecordTabular<'a> {
    let columns: Arc<[ColumnPath]> = columns.into();
    Box::new(move |row, ts, values, extra| {
        record_tabular(recorder, &columns, row, ts, values, extra)
    })
}

/// A fixed column layout that can be bound to any recorder
///
/// Cheap to clone; the column list is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSchema {
    columns: Arc<[ColumnPath]>,
}

impl TabularSchema {
    /// Create a schema from its columns, in positional order
    pub fn new(columns: impl IntoIterator<Item = ColumnPath>) -> Self {
        TabularSchema {
            columns: columns.into_iter().collect(),
        }
    }

    /// Bound columns
    pub fn columns(&self) -> &[ColumnPath] {
        &self.columns
    }

    /// Number of bound columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no columns are bound
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Build the flat row for positional `values`
    pub fn build_row(
        &self,
        row: RowPath,
        ts: Timestamp,
        values: Vec<CellValue>,
        extra: Vec<(ColumnPath, CellValue)>,
    ) -> StrataResult<FlatRow> {
        build_tabular_row(&self.columns, row, ts, values, extra)
    }

    /// Ask `recorder` for its specialized closure over this layout
    pub fn bind<'a, R: Recorder + ?Sized>(&self, recorder: &'a R) -> RecordTabular<'a> {
        recorder.specialize_record_tabular(&self.columns)
    }
}
