//! Built-in recorder backends
//!
//! This crate implements the recorder kinds every Strata process ships with:
//! - memory: rows in a shared, named in-memory dataset
//! - null: discards rows, counting them
//! - jsonl: appends rows to a JSON-lines file
//!
//! [`register_builtin_recorders`] is the startup routine that adds them to a
//! registry under the `builtin` package.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod jsonl;
pub mod memory;
pub mod null;

pub use jsonl::{read_jsonl, JsonlConfig, JsonlRecorder, JSONL_KIND};
pub use memory::{MemoryConfig, MemoryDataset, MemoryDatasets, MemoryRecorder, MEMORY_KIND};
pub use null::{NullConfig, NullRecorder, NULL_KIND};

use strata_core::StrataResult;
use strata_recorder::{RecorderFlags, RecorderRegistration, RecorderRegistry};
use tracing::info;

/// Package the built-in kinds are registered under
pub const BUILTIN_PACKAGE: &str = "builtin";

/// Registration handles of the built-in kinds
#[derive(Debug, Clone)]
pub struct BuiltinRecorders {
    /// `builtin/memory`
    pub memory: RecorderRegistration<MemoryRecorder>,
    /// `builtin/null`
    pub null: RecorderRegistration<NullRecorder>,
    /// `builtin/jsonl`
    pub jsonl: RecorderRegistration<JsonlRecorder>,
}

/// Register the built-in kinds
///
/// # Errors
///
/// Returns `ConfigConflict` if any of them is already registered, for
/// example when called twice on one registry.
pub fn register_builtin_recorders(registry: &RecorderRegistry) -> StrataResult<BuiltinRecorders> {
    let memory = RecorderRegistration::with_options(
        registry,
        BUILTIN_PACKAGE,
        MEMORY_KIND,
        "Stores rows in a named in-memory dataset shared within a context",
        "recorders/Memory.md",
        None,
        RecorderFlags::CONCURRENT
            | RecorderFlags::ATOMIC_BATCHES
            | RecorderFlags::SPECIALIZED_TABULAR,
    )?;
    let null = RecorderRegistration::with_options(
        registry,
        BUILTIN_PACKAGE,
        NULL_KIND,
        "Discards rows, counting them",
        "recorders/Null.md",
        None,
        RecorderFlags::CONCURRENT | RecorderFlags::ATOMIC_BATCHES,
    )?;
    let jsonl = RecorderRegistration::with_options(
        registry,
        BUILTIN_PACKAGE,
        JSONL_KIND,
        "Appends rows to a JSON-lines file",
        "recorders/Jsonl.md",
        None,
        RecorderFlags::CONCURRENT | RecorderFlags::PERSISTENT,
    )?;
    info!(package = BUILTIN_PACKAGE, kinds = 3, "Registered built-in recorders");
    Ok(BuiltinRecorders { memory, null, jsonl })
}
