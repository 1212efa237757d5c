//! Statically typed recorder kinds
//!
//! Most backends know their implementation and configuration types at
//! compile time. Implementing [`RecorderKind`] lets the registry synthesize
//! the factory: deserialize the parameters, construct the recorder inside a
//! `tracing` span, hand it the span as its logger and return it.
//!
//! Backends plug themselves in through [`RecorderRegistration`], called from
//! an explicit startup routine instead of a central list of implementations.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use strata_core::{StrataError, StrataResult};
use tracing::{debug, info_span};

use crate::config::RecorderConfig;
use crate::context::RecorderContext;
use crate::progress::ProgressReporter;
use crate::recorder::Recorder;
use crate::registry::{RecorderFactory, RecorderFlags, RecorderRegistry, RecorderType};
use crate::routes::TypeRouteHandler;
use crate::schema::{ConfigSchema, TypedConfigSchema};

/// A recorder implementation with a typed configuration
pub trait RecorderKind: Recorder + Sized + 'static {
    /// Parameters the kind is constructed from
    type Config: DeserializeOwned + Send + 'static;

    /// Construct an instance
    ///
    /// Long constructions should call `progress.report` between steps and
    /// propagate its error.
    fn create(
        ctx: &RecorderContext,
        config: Self::Config,
        progress: &ProgressReporter<'_>,
    ) -> StrataResult<Self>;

    /// Receive the span the instance logs under
    fn attach_logger(&mut self, span: tracing::Span);

    /// Schema validating the kind's parameters
    fn schema() -> Arc<dyn ConfigSchema> {
        Arc::new(TypedConfigSchema::<Self::Config>::new())
    }
}

/// Factory constructing `R` from a config's parameters
pub fn kind_factory<R: RecorderKind>(package: &str, name: &str) -> RecorderFactory {
    let package = package.to_string();
    let name = name.to_string();
    Arc::new(
        move |ctx: &RecorderContext, config: &RecorderConfig, progress: &ProgressReporter<'_>| {
            progress.report(json!({
                "kind": name,
                "package": package,
                "stage": "initializing",
            }))?;

            let params: R::Config = serde_json::from_value(config.params_or_empty())
                .map_err(|e| StrataError::config_validation(name.as_str(), e.to_string()))?;

            let span = info_span!(
                "recorder",
                package = %package,
                kind = %name,
                implementation = std::any::type_name::<R>()
            );
            let mut recorder = {
                let _enter = span.enter();
                debug!("Constructing recorder");
                R::create(ctx, params, progress)?
            };
            recorder.attach_logger(span);
            Ok(Arc::new(recorder) as Arc<dyn Recorder>)
        },
    )
}

/// Handle proving that `R` was registered
///
/// Constructing one registers the kind; the handle keeps the stored
/// descriptor.
pub struct RecorderRegistration<R> {
    handle: Arc<RecorderType>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: RecorderKind> RecorderRegistration<R> {
    /// Register `R` under `(package, name)` with no routes or flags
    pub fn new(
        registry: &RecorderRegistry,
        package: &str,
        name: &str,
        description: &str,
    ) -> StrataResult<Self> {
        Self::with_options(registry, package, name, description, "", None, RecorderFlags::NONE)
    }

    /// Register `R` with a documentation route, custom route and flags
    pub fn with_options(
        registry: &RecorderRegistry,
        package: &str,
        name: &str,
        description: &str,
        doc_route: &str,
        custom_route: Option<TypeRouteHandler>,
        flags: RecorderFlags,
    ) -> StrataResult<Self> {
        let handle =
            registry.register_kind::<R>(package, name, description, doc_route, custom_route, flags)?;
        Ok(RecorderRegistration {
            handle,
            _marker: PhantomData,
        })
    }

    /// Stored descriptor
    pub fn handle(&self) -> &Arc<RecorderType> {
        &self.handle
    }
}

impl<R> Clone for RecorderRegistration<R> {
    fn clone(&self) -> Self {
        RecorderRegistration {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for RecorderRegistration<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderRegistration")
            .field("package", &self.handle.package())
            .field("name", &self.handle.name())
            .finish()
    }
}
