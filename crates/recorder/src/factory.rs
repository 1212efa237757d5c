//! Recorder factory
//!
//! Turns a [`RecorderConfig`] into a live recorder: resolve the kind,
//! validate the parameters against the kind's schema, then run the kind's
//! factory with a progress reporter wrapping the caller's callback.

use std::sync::Arc;

use strata_core::{StrataError, StrataResult};
use tracing::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::context::RecorderContext;
use crate::progress::{ProgressFn, ProgressReporter};
use crate::recorder::Recorder;

/// Construct the recorder `config` describes
///
/// `on_progress` is called zero or more times during construction; returning
/// `false` cancels it.
///
/// # Errors
///
/// - `KindNotFound` if no registered kind matches `config.kind`
/// - `ConfigValidation` if the parameters fail the kind's schema; the
///   factory is not invoked
/// - `ConstructionCancelled` if the progress callback asked to stop
/// - anything the kind's own construction returns
pub fn create_recorder(
    ctx: &RecorderContext,
    config: &RecorderConfig,
    on_progress: Option<ProgressFn<'_>>,
) -> StrataResult<Arc<dyn Recorder>> {
    let kind = ctx
        .registry()
        .resolve(&config.kind, config.package.as_deref())?;
    debug!(
        package = %kind.package(),
        kind = %kind.name(),
        id = ?config.id,
        "Resolved recorder kind"
    );

    let params = config.params_or_empty();
    if let Err(reason) = kind.schema().validate(&params) {
        warn!(kind = %kind.name(), %reason, "Recorder configuration rejected");
        return Err(StrataError::ConfigValidation {
            kind: kind.name().to_string(),
            reason,
        });
    }

    let progress = ProgressReporter::new(kind.name(), on_progress);
    match kind.create(ctx, config, &progress) {
        Ok(recorder) => {
            info!(
                package = %kind.package(),
                kind = %kind.name(),
                progress_events = progress.reports(),
                "Created recorder"
            );
            Ok(recorder)
        }
        Err(e) => {
            warn!(kind = %kind.name(), error = %e, "Recorder construction failed");
            Err(e)
        }
    }
}
