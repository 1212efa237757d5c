//! Recorder contract and kind registry
//!
//! This crate defines how data reaches a storage backend and how backends
//! are found and constructed:
//! - Recorder: the write-path trait, with owned and borrowing forms
//! - specialize: schema-bound tabular recording
//! - RecorderRegistry: catalog of recorder kinds keyed by `(package, name)`
//! - RecorderKind / RecorderRegistration: typed kinds and their registration
//! - create_recorder: config to live recorder, with progress and cancellation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod factory;
pub mod kind;
pub mod progress;
pub mod recorder;
pub mod registry;
pub mod routes;
pub mod schema;
pub mod specialize;

pub use config::{RecorderConfig, RecorderConfigSet};
pub use context::RecorderContext;
pub use factory::create_recorder;
pub use kind::{kind_factory, RecorderKind, RecorderRegistration};
pub use progress::{ProgressFn, ProgressReporter};
pub use recorder::{defaults, RecordTabular, Recorder};
pub use registry::{RecorderFactory, RecorderFlags, RecorderRegistry, RecorderType};
pub use routes::{internal_doc_redirect, RouteRequest, RouteResponse, TypeRouteHandler, DOC_ROUTE_PREFIX};
pub use schema::{AnyObjectSchema, ConfigSchema, TypedConfigSchema};
pub use specialize::{check_arity, TabularSchema};
