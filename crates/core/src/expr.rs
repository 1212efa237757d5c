//! Tree-shaped row values
//!
//! An [`ExpressionValue`] is a row before flattening: a scalar atom, an array,
//! or a keyed object, nested arbitrarily. Each atom carries its own timestamp.
//!
//! ## Flattening
//!
//! Flattening enumerates every leaf exactly once, depth-first, in the order the
//! tree stores them. Object keys and array indexes (in decimal) each append one
//! element to the column path. Empty arrays and objects produce no cells. A
//! root atom produces one cell at the root path.
//!
//! ```text
//! { a: 1@t1, b: [ x@t2, { c: 3@t3 } ] }
//!   =>  (a, 1, t1) (b.0, x, t2) (b.1.c, 3, t3)
//! ```
//!
//! ## Un-flattening
//!
//! [`ExpressionValue::from_cells`] goes the other way. Cells sharing a path
//! prefix are merged into one nested object in first-appearance order, and the
//! relative order of cells with the same column is preserved, so the
//! last-write-wins view of a row survives a round trip. A root-path cell is
//! only representable on its own, as a root atom.

use crate::error::{StrataError, StrataResult};
use crate::path::{ColumnPath, Path, PathElement};
use crate::row::Cell;
use crate::timestamp::Timestamp;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// Recursively nested row value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionValue {
    /// Scalar leaf with its effective time
    Atom {
        /// Scalar value
        value: CellValue,
        /// Effective time
        ts: Timestamp,
    },
    /// Ordered list; element `i` lives under path element `i`
    Array(Vec<ExpressionValue>),
    /// Keyed children in insertion order (duplicate keys are kept)
    Object(Vec<(PathElement, ExpressionValue)>),
}

impl Default for ExpressionValue {
    fn default() -> Self {
        ExpressionValue::Object(Vec::new())
    }
}

impl ExpressionValue {
    /// Scalar leaf
    pub fn atom(value: impl Into<CellValue>, ts: Timestamp) -> Self {
        ExpressionValue::Atom {
            value: value.into(),
            ts,
        }
    }

    /// Object from `(key, child)` pairs
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ExpressionValue)>,
        K: Into<PathElement>,
    {
        ExpressionValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Array from children
    pub fn array(items: impl IntoIterator<Item = ExpressionValue>) -> Self {
        ExpressionValue::Array(items.into_iter().collect())
    }

    /// Object with one atom per `(key, value)`, all sharing `ts`
    pub fn row_of<I, K, V>(entries: I, ts: Timestamp) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PathElement>,
        V: Into<CellValue>,
    {
        ExpressionValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), ExpressionValue::atom(v, ts)))
                .collect(),
        )
    }

    /// True for scalar leaves
    pub fn is_atom(&self) -> bool {
        matches!(self, ExpressionValue::Atom { .. })
    }

    /// Value and timestamp of a scalar leaf
    pub fn as_atom(&self) -> Option<(&CellValue, Timestamp)> {
        match self {
            ExpressionValue::Atom { value, ts } => Some((value, *ts)),
            _ => None,
        }
    }

    /// Child of an object by key; the last entry wins on duplicates
    pub fn field(&self, key: &str) -> Option<&ExpressionValue> {
        match self {
            ExpressionValue::Object(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k.as_str() == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Visit every leaf in flattening order
    pub fn for_each_leaf<F>(&self, mut f: F)
    where
        F: FnMut(&ColumnPath, &CellValue, Timestamp),
    {
        let mut prefix = Path::root();
        self.walk(&mut prefix, &mut f);
    }

    fn walk<F>(&self, prefix: &mut Path, f: &mut F)
    where
        F: FnMut(&ColumnPath, &CellValue, Timestamp),
    {
        match self {
            ExpressionValue::Atom { value, ts } => f(prefix, value, *ts),
            ExpressionValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    prefix.push(i);
                    item.walk(prefix, f);
                    prefix.pop();
                }
            }
            ExpressionValue::Object(entries) => {
                for (key, child) in entries {
                    prefix.push(key.clone());
                    child.walk(prefix, f);
                    prefix.pop();
                }
            }
        }
    }

    /// Flatten into cells, leaving the tree intact
    pub fn flatten(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.leaf_count());
        self.for_each_leaf(|column, value, ts| {
            cells.push(Cell {
                column: column.clone(),
                value: value.clone(),
                ts,
            })
        });
        cells
    }

    /// Flatten into cells, moving leaf values out of the tree
    pub fn into_cells(self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.leaf_count());
        let mut prefix = Path::root();
        self.drain_into(&mut prefix, &mut cells);
        cells
    }

    fn drain_into(self, prefix: &mut Path, out: &mut Vec<Cell>) {
        match self {
            ExpressionValue::Atom { value, ts } => out.push(Cell {
                column: prefix.clone(),
                value,
                ts,
            }),
            ExpressionValue::Array(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    prefix.push(i);
                    item.drain_into(prefix, out);
                    prefix.pop();
                }
            }
            ExpressionValue::Object(entries) => {
                for (key, child) in entries {
                    prefix.push(key);
                    child.drain_into(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// Number of leaves, i.e. cells produced by flattening
    pub fn leaf_count(&self) -> usize {
        match self {
            ExpressionValue::Atom { .. } => 1,
            ExpressionValue::Array(items) => items.iter().map(Self::leaf_count).sum(),
            ExpressionValue::Object(entries) => entries.iter().map(|(_, v)| v.leaf_count()).sum(),
        }
    }

    /// Latest leaf timestamp, `None` when there are no leaves
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        let mut latest: Option<Timestamp> = None;
        self.for_each_leaf(|_, _, ts| {
            latest = Some(latest.map_or(ts, |l| l.max(ts)));
        });
        latest
    }

    /// Rebuild a tree from flattened cells
    ///
    /// A single cell at the root path becomes a root atom. A root-path cell
    /// next to any other cell has no tree form and fails with
    /// [`StrataError::MixedRootColumn`].
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> StrataResult<Self> {
        let cells: Vec<Cell> = cells.into_iter().collect();
        if cells.iter().any(|c| c.column.is_root()) {
            if cells.len() > 1 {
                return Err(StrataError::MixedRootColumn {
                    others: cells.len() - 1,
                });
            }
            if let Some(Cell { value, ts, .. }) = cells.into_iter().next() {
                return Ok(ExpressionValue::Atom { value, ts });
            }
            return Ok(ExpressionValue::default());
        }

        let mut entries: Vec<(PathElement, ExpressionValue)> = Vec::new();
        for cell in cells {
            insert_cell(&mut entries, cell);
        }
        Ok(ExpressionValue::Object(entries))
    }

    /// Build a tree from JSON, stamping every leaf with `ts`
    pub fn from_json(json: &serde_json::Value, ts: Timestamp) -> Self {
        match json {
            serde_json::Value::Array(items) => {
                ExpressionValue::Array(items.iter().map(|v| Self::from_json(v, ts)).collect())
            }
            serde_json::Value::Object(map) => ExpressionValue::Object(
                map.iter()
                    .map(|(k, v)| (PathElement::new(k.as_str()), Self::from_json(v, ts)))
                    .collect(),
            ),
            scalar => ExpressionValue::Atom {
                value: CellValue::from_json(scalar).unwrap_or_default(),
                ts,
            },
        }
    }

    /// Render as JSON, dropping timestamps (duplicate keys: last wins)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ExpressionValue::Atom { value, .. } => value.to_json(),
            ExpressionValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            ExpressionValue::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn insert_cell(entries: &mut Vec<(PathElement, ExpressionValue)>, cell: Cell) {
    let Cell { column, value, ts } = cell;
    let mut elements = column.elements().iter().cloned();
    if let Some(first) = elements.next() {
        insert_at(entries, first, elements, value, ts);
    }
}

fn insert_at(
    entries: &mut Vec<(PathElement, ExpressionValue)>,
    key: PathElement,
    mut rest: impl Iterator<Item = PathElement>,
    value: CellValue,
    ts: Timestamp,
) {
    let Some(next) = rest.next() else {
        entries.push((key, ExpressionValue::Atom { value, ts }));
        return;
    };

    // Merge into the most recent object under the same key
    let existing = entries
        .iter()
        .rposition(|(k, v)| *k == key && matches!(v, ExpressionValue::Object(_)));
    let index = match existing {
        Some(i) => i,
        None => {
            entries.push((key, ExpressionValue::Object(Vec::new())));
            entries.len() - 1
        }
    };
    if let ExpressionValue::Object(children) = &mut entries[index].1 {
        insert_at(children, next, rest, value, ts);
    }
}
