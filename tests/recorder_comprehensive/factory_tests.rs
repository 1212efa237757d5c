//! Factory Tests
//!
//! Resolution, schema validation before construction, progress reporting
//! and cooperative cancellation.

use crate::test_utils::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_ingest::{create_recorder, RecorderConfig, StrataError};

#[test]
fn unknown_kind_is_not_found() {
    let ctx = fresh_context();
    let err = expect_err(create_recorder(&ctx, &RecorderConfig::new("kafka"), None));
    assert!(err.is_kind_not_found());
    assert!(matches!(err, StrataError::KindNotFound { ref kind } if kind == "kafka"));
}

#[test]
fn memory_without_dataset_fails_validation() {
    let ctx = fresh_context();
    let config = RecorderConfig::new("memory").with_param("max_rows", 10);
    let err = expect_err(create_recorder(&ctx, &config, None));
    match err {
        StrataError::ConfigValidation { kind, reason } => {
            assert_eq!(kind, "memory");
            assert!(reason.contains("dataset"), "reason: {}", reason);
        }
        other => panic!("expected ConfigValidation, got {:?}", other),
    }
}

#[test]
fn schema_mismatch_never_reaches_factory() {
    let ctx = fresh_context();
    let bad = [
        RecorderConfig::new("counting"),
        RecorderConfig::new("counting").with_param("label", 5),
        RecorderConfig::new("counting")
            .with_param("label", "x")
            .with_param("unknown", true),
    ];
    for config in &bad {
        let err = expect_err(create_recorder(&ctx, config, None));
        assert!(err.is_config_validation(), "{:?}", config);
    }
    assert_eq!(ctx.extension::<FactoryCalls>().unwrap().get(), 0);
}

#[test]
fn cancel_on_first_progress_call() {
    let ctx = fresh_context();
    let calls = AtomicUsize::new(0);
    let cancel = |_: &serde_json::Value| {
        calls.fetch_add(1, Ordering::SeqCst);
        false
    };
    let config = RecorderConfig::new("counting")
        .with_param("label", "x")
        .with_param("steps", 5);

    let err = expect_err(create_recorder(&ctx, &config, Some(&cancel)));

    assert!(err.is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Cancelled before the kind's own constructor ran
    assert_eq!(ctx.extension::<FactoryCalls>().unwrap().get(), 0);
}

#[test]
fn cancel_midway_returns_no_instance() {
    let ctx = fresh_context();
    let seen = AtomicUsize::new(0);
    let stop_after_two = |_: &serde_json::Value| seen.fetch_add(1, Ordering::SeqCst) < 2;
    let config = RecorderConfig::new("counting")
        .with_param("label", "x")
        .with_param("steps", 5);

    let err = expect_err(create_recorder(&ctx, &config, Some(&stop_after_two)));

    assert!(err.is_cancelled());
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert_eq!(ctx.extension::<FactoryCalls>().unwrap().get(), 1);
}

#[test]
fn progress_payloads_in_order() {
    let ctx = fresh_context();
    let payloads = Mutex::new(Vec::new());
    let record = |p: &serde_json::Value| {
        payloads.lock().push(p.clone());
        true
    };
    let config = RecorderConfig::new("counting")
        .with_param("label", "x")
        .with_param("steps", 2);

    create_recorder(&ctx, &config, Some(&record)).unwrap();

    let payloads = payloads.lock();
    assert_eq!(payloads.len(), 3);
    assert_eq!(payloads[0]["stage"], "initializing");
    assert_eq!(payloads[0]["kind"], "counting");
    assert_eq!(payloads[1]["step"], 1);
    assert_eq!(payloads[2]["step"], 2);
}

#[test]
fn null_params_read_as_empty_object() {
    let ctx = fresh_context();
    let config = RecorderConfig::new("null").with_params(serde_json::Value::Null);
    assert!(create_recorder(&ctx, &config, None).is_ok());
}

#[test]
fn context_helper_matches_free_function() {
    let ctx = fresh_context();
    let config = RecorderConfig::new("counting").with_param("label", "helper");
    let recorder = ctx.create_recorder(&config, None).unwrap();
    assert_eq!(recorder.status()["label"], "helper");
}
