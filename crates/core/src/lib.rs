//! Core types for the Strata write path
//!
//! This crate defines the two shapes a record can take on its way into a
//! storage backend:
//! - Path: RowPath / ColumnPath identifiers
//! - CellValue: scalar value held by one cell
//! - Timestamp: effective time of a cell value
//! - Cell / FlatRow: flattened `(column, value, timestamp)` triples
//! - ExpressionValue: tree-shaped value, with flattening in both directions
//! - StrataError: error taxonomy shared by every crate in the workspace

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod expr;
pub mod path;
pub mod row;
pub mod timestamp;
pub mod value;

pub use error::{StrataError, StrataResult};
pub use expr::ExpressionValue;
pub use path::{ColumnPath, Path, PathElement, PathParseError, RowPath};
pub use row::{Cell, FlatRow};
pub use timestamp::Timestamp;
pub use value::CellValue;
