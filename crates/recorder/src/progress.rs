//! Construction progress
//!
//! Factories report progress while they build a recorder. The caller's
//! callback returns `false` to ask for construction to stop; the next
//! `report` then fails with [`StrataError::ConstructionCancelled`] and the
//! factory propagates it instead of returning a half-built recorder.
//! Cancellation is cooperative: nothing is interrupted between reports.

use std::cell::Cell;

use strata_core::{StrataError, StrataResult};
use tracing::debug;

/// Progress callback supplied by the code requesting a recorder
pub type ProgressFn<'a> = &'a dyn Fn(&serde_json::Value) -> bool;

/// Relays progress payloads to an optional callback
pub struct ProgressReporter<'a> {
    kind: String,
    callback: Option<ProgressFn<'a>>,
    reports: Cell<usize>,
}

impl<'a> ProgressReporter<'a> {
    /// Reporter for constructing a recorder of `kind`
    pub fn new(kind: impl Into<String>, callback: Option<ProgressFn<'a>>) -> Self {
        ProgressReporter {
            kind: kind.into(),
            callback,
            reports: Cell::new(0),
        }
    }

    /// Reporter without a callback; every report succeeds
    pub fn silent(kind: impl Into<String>) -> Self {
        Self::new(kind, None)
    }

    /// Kind being constructed
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of payloads reported so far
    pub fn reports(&self) -> usize {
        self.reports.get()
    }

    /// Report a payload
    ///
    /// # Errors
    ///
    /// Returns `ConstructionCancelled` if the callback returned `false`.
    pub fn report(&self, payload: serde_json::Value) -> StrataResult<()> {
        self.reports.set(self.reports.get() + 1);
        let Some(callback) = self.callback else {
            return Ok(());
        };
        if callback(&payload) {
            Ok(())
        } else {
            debug!(kind = %self.kind, "Recorder construction cancelled by progress callback");
            Err(StrataError::ConstructionCancelled {
                kind: self.kind.clone(),
            })
        }
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("kind", &self.kind)
            .field("has_callback", &self.callback.is_some())
            .field("reports", &self.reports.get())
            .finish()
    }
}
