//! Recorder type registry
//!
//! The registry is the catalog of recorder kinds: it maps `(package, name)`
//! to a [`RecorderType`] descriptor holding the kind's factory and
//! configuration schema.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = RecorderRegistry::new();
//!
//! // Register a kind whose implementation and config are known statically
//! registry.register_kind::<MemoryRecorder>(
//!     "builtin",
//!     "memory",
//!     "Stores rows in a shared in-memory dataset",
//!     "recorders/Memory.md",
//!     None,
//!     RecorderFlags::CONCURRENT,
//! )?;
//!
//! // Resolve the kind a config names
//! let kind = registry.resolve("memory", None)?;
//! ```
//!
//! Descriptors are never mutated or removed once registered. The registry is
//! populated at startup and read-only afterwards, though registering later is
//! safe.

use std::collections::BTreeMap;
use std::ops::BitOr;
use std::sync::Arc;

use parking_lot::RwLock;
use strata_core::{StrataError, StrataResult};
use tracing::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::context::RecorderContext;
use crate::kind::{self, RecorderKind};
use crate::progress::ProgressReporter;
use crate::recorder::Recorder;
use crate::routes::{internal_doc_redirect, TypeRouteHandler};
use crate::schema::ConfigSchema;

/// Factory turning a configuration into a live recorder
pub type RecorderFactory = Arc<
    dyn Fn(&RecorderContext, &RecorderConfig, &ProgressReporter<'_>) -> StrataResult<Arc<dyn Recorder>>
        + Send
        + Sync,
>;

/// Feature flags advertised by a recorder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecorderFlags(u32);

impl RecorderFlags {
    /// No flags
    pub const NONE: RecorderFlags = RecorderFlags(0);
    /// Instances accept concurrent `record_*` calls
    pub const CONCURRENT: RecorderFlags = RecorderFlags(1);
    /// Batches are all-or-nothing
    pub const ATOMIC_BATCHES: RecorderFlags = RecorderFlags(1 << 1);
    /// Recorded rows outlive the process
    pub const PERSISTENT: RecorderFlags = RecorderFlags(1 << 2);
    /// The kind overrides tabular specialization
    pub const SPECIALIZED_TABULAR: RecorderFlags = RecorderFlags(1 << 3);

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every flag in `other` is set
    pub const fn contains(self, other: RecorderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RecorderFlags {
    type Output = RecorderFlags;

    fn bitor(self, rhs: RecorderFlags) -> RecorderFlags {
        RecorderFlags(self.0 | rhs.0)
    }
}

/// Descriptor of a registered recorder kind
pub struct RecorderType {
    package: String,
    name: String,
    description: String,
    factory: RecorderFactory,
    schema: Arc<dyn ConfigSchema>,
    doc_route: Option<TypeRouteHandler>,
    custom_route: Option<TypeRouteHandler>,
    flags: RecorderFlags,
}

impl RecorderType {
    /// Descriptor without routes or flags
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: RecorderFactory,
        schema: Arc<dyn ConfigSchema>,
    ) -> Self {
        RecorderType {
            package: package.into(),
            name: name.into(),
            description: description.into(),
            factory,
            schema,
            doc_route: None,
            custom_route: None,
            flags: RecorderFlags::NONE,
        }
    }

    /// Attach a documentation route handler
    pub fn with_doc_route(mut self, handler: Option<TypeRouteHandler>) -> Self {
        self.doc_route = handler;
        self
    }

    /// Attach a custom route handler
    pub fn with_custom_route(mut self, handler: Option<TypeRouteHandler>) -> Self {
        self.custom_route = handler;
        self
    }

    /// Set the feature flags
    pub fn with_flags(mut self, flags: RecorderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Package the kind was registered under
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Kind name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Configuration schema
    pub fn schema(&self) -> &dyn ConfigSchema {
        self.schema.as_ref()
    }

    /// Documentation route handler
    pub fn doc_route(&self) -> Option<&TypeRouteHandler> {
        self.doc_route.as_ref()
    }

    /// Custom route handler
    pub fn custom_route(&self) -> Option<&TypeRouteHandler> {
        self.custom_route.as_ref()
    }

    /// Feature flags
    pub fn flags(&self) -> RecorderFlags {
        self.flags
    }

    /// Invoke the factory
    ///
    /// Does not validate `config`; [`crate::create_recorder`] does that first.
    pub fn create(
        &self,
        ctx: &RecorderContext,
        config: &RecorderConfig,
        progress: &ProgressReporter<'_>,
    ) -> StrataResult<Arc<dyn Recorder>> {
        (self.factory)(ctx, config, progress)
    }
}

impl std::fmt::Debug for RecorderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderType")
            .field("package", &self.package)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema.type_name())
            .field("doc_route", &self.doc_route.is_some())
            .field("custom_route", &self.custom_route.is_some())
            .field("flags", &self.flags)
            .finish()
    }
}

/// Catalog of recorder kinds keyed by `(package, name)`
pub struct RecorderRegistry {
    kinds: RwLock<BTreeMap<(String, String), Arc<RecorderType>>>,
}

impl RecorderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        RecorderRegistry {
            kinds: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a kind
    ///
    /// # Errors
    ///
    /// Returns `ConfigConflict` if `(package, name)` is already registered.
    /// The existing descriptor is left unchanged.
    pub fn register(&self, descriptor: RecorderType) -> StrataResult<Arc<RecorderType>> {
        let key = (descriptor.package.clone(), descriptor.name.clone());
        let mut kinds = self.kinds.write();
        if kinds.contains_key(&key) {
            warn!(package = %key.0, kind = %key.1, "Recorder kind already registered");
            return Err(StrataError::ConfigConflict {
                package: key.0,
                kind: key.1,
            });
        }
        let descriptor = Arc::new(descriptor);
        kinds.insert(key, descriptor.clone());
        info!(
            package = %descriptor.package,
            kind = %descriptor.name,
            "Registered recorder kind"
        );
        Ok(descriptor)
    }

    /// Register a kind whose implementation and config types are known
    ///
    /// The factory is synthesized from [`RecorderKind`]. A non-empty
    /// `doc_route` becomes a redirect to the kind's documentation page.
    pub fn register_kind<R: RecorderKind>(
        &self,
        package: &str,
        name: &str,
        description: &str,
        doc_route: &str,
        custom_route: Option<TypeRouteHandler>,
        flags: RecorderFlags,
    ) -> StrataResult<Arc<RecorderType>> {
        let descriptor = RecorderType::new(
            package,
            name,
            description,
            kind::kind_factory::<R>(package, name),
            R::schema(),
        )
        .with_doc_route(internal_doc_redirect(package, doc_route))
        .with_custom_route(custom_route)
        .with_flags(flags);
        self.register(descriptor)
    }

    /// Descriptor registered under `(package, name)`
    pub fn get(&self, package: &str, name: &str) -> Option<Arc<RecorderType>> {
        self.kinds
            .read()
            .get(&(package.to_string(), name.to_string()))
            .cloned()
    }

    /// Find the descriptor a config discriminator names
    ///
    /// With `package` set the lookup is exact. Without it, `kind` must be
    /// registered by exactly one package.
    ///
    /// # Errors
    ///
    /// `KindNotFound` when nothing matches; `ConfigValidation` when an
    /// unqualified kind is registered by several packages.
    pub fn resolve(&self, kind: &str, package: Option<&str>) -> StrataResult<Arc<RecorderType>> {
        if let Some(package) = package {
            return self.get(package, kind).ok_or_else(|| StrataError::KindNotFound {
                kind: format!("{}/{}", package, kind),
            });
        }

        let kinds = self.kinds.read();
        let mut matches = kinds.values().filter(|t| t.name == kind);
        let Some(first) = matches.next() else {
            debug!(kind, "No recorder kind registered under this name");
            return Err(StrataError::KindNotFound {
                kind: kind.to_string(),
            });
        };
        let others: Vec<&str> = matches.map(|t| t.package.as_str()).collect();
        if others.is_empty() {
            return Ok(first.clone());
        }
        Err(StrataError::config_validation(
            kind,
            format!(
                "kind is ambiguous, registered by packages {}, {}; set `package` to choose",
                first.package,
                others.join(", ")
            ),
        ))
    }

    /// Registered `(package, name)` keys, sorted
    pub fn kinds(&self) -> Vec<(String, String)> {
        self.kinds.read().keys().cloned().collect()
    }

    /// All descriptors, sorted by key
    pub fn list(&self) -> Vec<Arc<RecorderType>> {
        self.kinds.read().values().cloned().collect()
    }

    /// Check if `(package, name)` is registered
    pub fn contains(&self, package: &str, name: &str) -> bool {
        self.kinds
            .read()
            .contains_key(&(package.to_string(), name.to_string()))
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.kinds.read().is_empty()
    }
}

impl Default for RecorderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecorderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
