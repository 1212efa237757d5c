//! JSON-lines file recorder
//!
//! Appends one JSON object per recorded row:
//!
//! ```text
//! {"row":"sensors.s1","columns":[["temp",21.5,1700000000000000],["unit","C",1700000000000000]]}
//! ```
//!
//! Columns are `[column, value, timestamp_micros]` triples in recording
//! order. Bytes are written as base64 strings and timestamps as ISO-8601
//! strings, so [`read_jsonl`] returns those values as strings.
//!
//! Batches are best effort: rows are written in order and a failure stops
//! the batch. A row counts as written once its whole line has reached the
//! file, so the error names exactly how many of the batch's rows the file
//! holds. A line cut short by a failed write is truncated away. Calls are
//! serialized by a mutex.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strata_core::{Cell, CellValue, ExpressionValue, FlatRow, Path, RowPath, StrataError, StrataResult, Timestamp};
use strata_recorder::{defaults, ProgressReporter, Recorder, RecorderContext, RecorderKind};
use tracing::{debug, warn};

/// Kind name the jsonl backend registers under
pub const JSONL_KIND: &str = "jsonl";

/// Parameters of the jsonl backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonlConfig {
    /// Output file
    pub path: PathBuf,
    /// Keep existing content instead of truncating
    #[serde(default)]
    pub append: bool,
}

/// Recorder appending rows to a JSON-lines file
pub struct JsonlRecorder {
    path: PathBuf,
    file: Mutex<File>,
    rows_written: AtomicU64,
    span: tracing::Span,
}

impl JsonlRecorder {
    /// Open (or create) the file at `path`
    pub fn open(path: impl AsRef<FsPath>, append: bool) -> StrataResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)?;
        Ok(JsonlRecorder {
            path,
            file: Mutex::new(file),
            rows_written: AtomicU64::new(0),
            span: tracing::Span::none(),
        })
    }

    /// Output file
    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// Rows written since opening
    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    fn write_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        let total = rows.len();
        let lines = rows
            .iter()
            .map(encode_line)
            .collect::<StrataResult<Vec<_>>>()?;

        let mut file = self.file.lock();
        for (written, line) in lines.iter().enumerate() {
            if let Err(e) = write_line(&mut file, line) {
                warn!(parent: &self.span, written, total, error = %e, "Batch stopped by write failure");
                return Err(StrataError::recording(
                    JSONL_KIND,
                    format!(
                        "wrote {} of {} rows to {}: {}",
                        written,
                        total,
                        self.path.display(),
                        e
                    ),
                ));
            }
            self.rows_written.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for JsonlRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.file.get_mut().flush() {
            warn!(parent: &self.span, path = %self.path.display(), error = %e, "Flush on close failed");
        }
    }
}

/// Write one complete line, rolling the file back if only part of it landed
fn write_line(file: &mut File, line: &[u8]) -> io::Result<()> {
    let start = file.metadata()?.len();
    let result = file.write_all(line).and_then(|()| file.flush());
    if result.is_err() {
        if let Err(e) = file.set_len(start).and_then(|()| file.seek(SeekFrom::Start(start)).map(drop)) {
            debug!(error = %e, "Could not roll back partial line");
        }
    }
    result
}

fn encode_line(row: &FlatRow) -> StrataResult<Vec<u8>> {
    let mut line = serde_json::to_vec(&encode_row(row))?;
    line.push(b'\n');
    Ok(line)
}

fn encode_row(row: &FlatRow) -> serde_json::Value {
    let columns: Vec<serde_json::Value> = row
        .columns
        .iter()
        .map(|cell| json!([cell.column.to_string(), cell.value.to_json(), cell.ts.as_micros()]))
        .collect();
    json!({ "row": row.row.to_string(), "columns": columns })
}

fn decode_row(line: &str) -> StrataResult<FlatRow> {
    let invalid = |what: &str| StrataError::Serialization(format!("invalid jsonl row: {}", what));

    let value: serde_json::Value = serde_json::from_str(line)?;
    let row: RowPath = value["row"]
        .as_str()
        .ok_or_else(|| invalid("missing row"))?
        .parse()?;
    let triples = value["columns"]
        .as_array()
        .ok_or_else(|| invalid("missing columns"))?;

    let mut columns = Vec::with_capacity(triples.len());
    for triple in triples {
        let column: Path = triple[0]
            .as_str()
            .ok_or_else(|| invalid("column is not a string"))?
            .parse()?;
        let value = CellValue::from_json(&triple[1]).ok_or_else(|| invalid("value is not a scalar"))?;
        let ts = triple[2]
            .as_u64()
            .map(Timestamp::from_micros)
            .ok_or_else(|| invalid("timestamp is not an integer"))?;
        columns.push(Cell { column, value, ts });
    }
    Ok(FlatRow { row, columns })
}

/// Read back a file written by [`JsonlRecorder`]
pub fn read_jsonl(path: impl AsRef<FsPath>) -> StrataResult<Vec<FlatRow>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(decode_row(&line)?);
    }
    Ok(rows)
}

impl Recorder for JsonlRecorder {
    fn kind(&self) -> &str {
        JSONL_KIND
    }

    fn record_row(&self, row: FlatRow) -> StrataResult<()> {
        self.write_rows(vec![row])
    }

    fn record_rows(&self, rows: Vec<FlatRow>) -> StrataResult<()> {
        self.write_rows(rows)
    }

    fn record_row_expr(&self, row: RowPath, expr: ExpressionValue) -> StrataResult<()> {
        defaults::record_row_expr_flattened(self, row, expr)
    }

    fn record_rows_expr(&self, rows: Vec<(RowPath, ExpressionValue)>) -> StrataResult<()> {
        defaults::record_rows_expr_flattened(self, rows)
    }

    fn finished_chunk(&self) -> StrataResult<()> {
        self.file.lock().flush()?;
        debug!(parent: &self.span, rows = self.rows_written(), "Flushed chunk");
        Ok(())
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "path": self.path.display().to_string(),
            "rows": self.rows_written(),
        })
    }
}

impl RecorderKind for JsonlRecorder {
    type Config = JsonlConfig;

    fn create(
        _ctx: &RecorderContext,
        config: JsonlConfig,
        progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self> {
        progress.report(json!({
            "stage": "opening",
            "path": config.path.display().to_string(),
            "append": config.append,
        }))?;
        JsonlRecorder::open(&config.path, config.append)
    }

    fn attach_logger(&mut self, span: tracing::Span) {
        self.span = span;
    }
}
