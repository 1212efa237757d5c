//! Construction context
//!
//! Factories receive a [`RecorderContext`]: the registry that resolved them
//! plus a type-keyed extension store for state that recorders of one context
//! share (for example the in-memory datasets several memory recorders write
//! to).

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use strata_core::{StrataError, StrataResult};

use crate::config::RecorderConfig;
use crate::factory;
use crate::progress::ProgressFn;
use crate::recorder::Recorder;
use crate::registry::RecorderRegistry;

/// Environment handed to recorder factories
pub struct RecorderContext {
    registry: Arc<RecorderRegistry>,
    /// Type-erased shared state, created lazily by `extension<T>()`
    extensions: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RecorderContext {
    /// Context resolving kinds through `registry`
    pub fn new(registry: Arc<RecorderRegistry>) -> Self {
        RecorderContext {
            registry,
            extensions: DashMap::new(),
        }
    }

    /// Registry kinds are resolved against
    pub fn registry(&self) -> &Arc<RecorderRegistry> {
        &self.registry
    }

    /// Get or create the extension of type `T`
    ///
    /// Every caller on one context receives the same instance. Safe to call
    /// concurrently; the extension is created at most once.
    pub fn extension<T: Any + Send + Sync + Default>(&self) -> StrataResult<Arc<T>> {
        let type_id = TypeId::of::<T>();

        let entry = self
            .extensions
            .entry(type_id)
            .or_insert_with(|| Arc::new(T::default()) as Arc<dyn Any + Send + Sync>);

        entry.value().clone().downcast::<T>().map_err(|_| {
            StrataError::internal(format!("extension type mismatch for TypeId {:?}", type_id))
        })
    }

    /// Construct a recorder from `config`, see [`factory::create_recorder`]
    pub fn create_recorder(
        &self,
        config: &RecorderConfig,
        on_progress: Option<ProgressFn<'_>>,
    ) -> StrataResult<Arc<dyn Recorder>> {
        factory::create_recorder(self, config, on_progress)
    }
}

impl std::fmt::Debug for RecorderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderContext")
            .field("registry", &self.registry)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
