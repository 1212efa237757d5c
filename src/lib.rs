//! Strata ingest - pluggable write path for Strata storage backends
//!
//! Producers hand rows to a [`Recorder`], either flattened into
//! `(column, value, timestamp)` triples or as nested [`ExpressionValue`]
//! trees. Backends are registered as recorder kinds and constructed from
//! declarative [`RecorderConfig`]s.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_ingest::{context, RecorderConfig, FlatRow, Cell, Timestamp};
//!
//! let ctx = context()?;
//! let config = RecorderConfig::new("memory").with_param("dataset", "events");
//! let recorder = ctx.create_recorder(&config, None)?;
//!
//! recorder.record_row(FlatRow::new(
//!     "sensor.s1",
//!     vec![Cell::new("temp", 21.5, Timestamp::now())],
//! ))?;
//! ```
//!
//! # Architecture
//!
//! - `strata-core`: row representation and errors
//! - `strata-recorder`: the Recorder trait, registry and factory
//! - `strata-storage`: the built-in backends
//!
//! [`recorders`] is the process registry. It is populated with the built-in
//! kinds on first successful use; other backends register into it at startup.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::error;

pub use strata_core::{
    Cell, CellValue, ColumnPath, ExpressionValue, FlatRow, Path, PathElement, PathParseError,
    RowPath, StrataError, StrataResult, Timestamp,
};
pub use strata_recorder::{
    create_recorder, defaults, internal_doc_redirect, kind_factory, AnyObjectSchema, ConfigSchema,
    ProgressFn, ProgressReporter, RecordTabular, Recorder, RecorderConfig, RecorderConfigSet,
    RecorderContext, RecorderFactory, RecorderFlags, RecorderKind, RecorderRegistration,
    RecorderRegistry, RecorderType, RouteRequest, RouteResponse, TabularSchema, TypeRouteHandler,
    TypedConfigSchema,
};
pub use strata_storage::{
    read_jsonl, register_builtin_recorders, BuiltinRecorders, JsonlRecorder, MemoryDataset,
    MemoryDatasets, MemoryRecorder, NullRecorder, BUILTIN_PACKAGE,
};

static RECORDERS: OnceCell<Arc<RecorderRegistry>> = OnceCell::new();

/// The process registry, with the built-in kinds registered
///
/// The registry is only published once every built-in kind registered. A
/// failure is returned to the caller and the next call starts over.
pub fn recorders() -> StrataResult<&'static Arc<RecorderRegistry>> {
    RECORDERS.get_or_try_init(|| {
        let registry = RecorderRegistry::new();
        register_builtin_recorders(&registry).map_err(|e| {
            error!(error = %e, "Failed to register built-in recorders");
            e
        })?;
        Ok(Arc::new(registry))
    })
}

/// A fresh context over the process registry
///
/// Contexts do not share extensions: two contexts get separate memory
/// datasets.
pub fn context() -> StrataResult<RecorderContext> {
    Ok(RecorderContext::new(recorders()?.clone()))
}

/// Install a `tracing` fmt subscriber for the process
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
