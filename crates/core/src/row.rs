//! Flattened rows
//!
//! A [`FlatRow`] is a row name plus an ordered list of [`Cell`] triples
//! `(column, value, timestamp)`. Column order is insertion order. Receivers
//! that see the same column twice apply last-write-wins.

use crate::error::StrataResult;
use crate::expr::ExpressionValue;
use crate::path::{ColumnPath, RowPath};
use crate::timestamp::Timestamp;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One flattened cell: column, value and the time the value became effective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Column the value belongs to
    pub column: ColumnPath,
    /// Scalar value
    pub value: CellValue,
    /// Effective time of the value
    pub ts: Timestamp,
}

impl Cell {
    /// Create a cell
    pub fn new(column: impl Into<ColumnPath>, value: impl Into<CellValue>, ts: Timestamp) -> Self {
        Cell {
            column: column.into(),
            value: value.into(),
            ts,
        }
    }
}

impl From<(ColumnPath, CellValue, Timestamp)> for Cell {
    fn from((column, value, ts): (ColumnPath, CellValue, Timestamp)) -> Self {
        Cell { column, value, ts }
    }
}

impl From<Cell> for (ColumnPath, CellValue, Timestamp) {
    fn from(cell: Cell) -> Self {
        (cell.column, cell.value, cell.ts)
    }
}

/// A row in flattened form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    /// Row name
    pub row: RowPath,
    /// Cells in insertion order
    pub columns: Vec<Cell>,
}

impl FlatRow {
    /// Create a row from its name and cells
    pub fn new(row: impl Into<RowPath>, columns: Vec<Cell>) -> Self {
        FlatRow {
            row: row.into(),
            columns,
        }
    }

    /// Flatten a tree value into a row, consuming it
    pub fn from_expr(row: RowPath, expr: ExpressionValue) -> Self {
        FlatRow {
            row,
            columns: expr.into_cells(),
        }
    }

    /// Rebuild the tree form of this row
    ///
    /// Fails when a root-path cell shares the row with other cells.
    pub fn into_expr(self) -> StrataResult<(RowPath, ExpressionValue)> {
        let expr = ExpressionValue::from_cells(self.columns)?;
        Ok((self.row, expr))
    }

    /// Number of cells, duplicates included
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Effective value per column with last-write-wins applied
    pub fn latest_values(&self) -> BTreeMap<&ColumnPath, &CellValue> {
        let mut latest = BTreeMap::new();
        for cell in &self.columns {
            latest.insert(&cell.column, &cell.value);
        }
        latest
    }
}
