//! Built-in Backend Tests
//!
//! The memory, null and jsonl kinds constructed from TOML and JSON
//! configuration, the way a deployment would configure them.

use crate::test_utils::*;
use std::sync::Arc;
use strata_ingest::{
    create_recorder, read_jsonl, Cell, CellValue, ExpressionValue, FlatRow, MemoryDatasets, Path,
    Recorder, RecorderConfig, RecorderConfigSet, StrataError,
};
use tempfile::TempDir;

#[test]
fn recorders_from_toml_file() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("events.jsonl");
    let config_path = temp.path().join("recorders.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[[recorder]]
id = "hot"
type = "memory"
params = {{ dataset = "events", max_rows = 1000 }}

[[recorder]]
id = "archive"
type = "jsonl"
package = "builtin"
params = {{ path = "{}" }}

[[recorder]]
type = "null"
"#,
            out.display()
        ),
    )
    .unwrap();

    let set = RecorderConfigSet::from_file(&config_path).unwrap();
    assert_eq!(set.recorder.len(), 3);

    let ctx = fresh_context();
    let recorders: Vec<Arc<dyn Recorder>> = set
        .recorder
        .iter()
        .map(|config| create_recorder(&ctx, config, None).unwrap())
        .collect();

    let row = flat("sensor", &[("temp", 21), ("hum", 40)], ts(100));
    for recorder in &recorders {
        recorder.record_row_ref(&row).unwrap();
        recorder.finished_chunk().unwrap();
    }

    let events = ctx
        .extension::<MemoryDatasets>()
        .unwrap()
        .get("events")
        .unwrap();
    assert_eq!(events.row(&Path::new("sensor")).unwrap().column_count(), 2);
    assert_eq!(read_jsonl(&out).unwrap(), vec![row]);
    assert_eq!(recorders[2].status()["rows"], 1);
}

#[test]
fn memory_max_rows_rejects_whole_batch() {
    let ctx = fresh_context();
    let recorder = create_recorder(
        &ctx,
        &RecorderConfig::from_json(r#"{"type": "memory", "params": {"dataset": "small", "max_rows": 2}}"#)
            .unwrap(),
        None,
    )
    .unwrap();

    let err = recorder
        .record_rows(vec![
            flat("a", &[("v", 1)], ts(0)),
            flat("b", &[("v", 2)], ts(0)),
            flat("c", &[("v", 3)], ts(0)),
        ])
        .unwrap_err();
    assert!(matches!(err, StrataError::Recording { ref kind, .. } if kind == "memory"));
    assert_eq!(recorder.status()["rows"], 0);

    recorder
        .record_rows(vec![flat("a", &[("v", 1)], ts(0)), flat("b", &[("v", 2)], ts(0))])
        .unwrap();
    assert_eq!(recorder.status()["rows"], 2);
}

#[test]
fn memory_duplicate_columns_last_write_wins() {
    let ctx = fresh_context();
    let recorder = create_recorder(
        &ctx,
        &RecorderConfig::new("memory").with_param("dataset", "dups"),
        None,
    )
    .unwrap();

    recorder
        .record_row(FlatRow::new(
            "r",
            vec![
                Cell::new("x", 1i64, ts(9)),
                Cell::new("x", 2i64, ts(1)),
            ],
        ))
        .unwrap();

    let dataset = ctx
        .extension::<MemoryDatasets>()
        .unwrap()
        .get("dups")
        .unwrap();
    assert_eq!(
        dataset.get(&Path::new("r"), &Path::new("x")),
        Some((CellValue::Int(2), ts(1)))
    );
}

#[test]
fn separate_contexts_do_not_share_datasets() {
    let config = RecorderConfig::new("memory").with_param("dataset", "shared-name");
    let one = fresh_context();
    let two = fresh_context();
    let a = create_recorder(&one, &config, None).unwrap();
    let b = create_recorder(&two, &config, None).unwrap();

    a.record_row(flat("r", &[("v", 1)], ts(0))).unwrap();

    assert_eq!(a.status()["rows"], 1);
    assert_eq!(b.status()["rows"], 0);
}

#[test]
fn jsonl_records_tree_rows_flattened() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.jsonl");
    let ctx = fresh_context();
    let recorder = create_recorder(
        &ctx,
        &RecorderConfig::new("jsonl").with_param("path", path.display().to_string()),
        None,
    )
    .unwrap();

    let expr = ExpressionValue::from_json(
        &serde_json::json!({"user": {"name": "ada", "langs": ["rust", "ml"]}}),
        ts(7),
    );
    recorder
        .record_rows_expr(vec![(Path::new("u1"), expr.clone())])
        .unwrap();
    recorder.finished_chunk().unwrap();

    let rows = read_jsonl(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], FlatRow::from_expr(Path::new("u1"), expr));
    assert_eq!(recorder.status()["rows"], 1);
}

#[test]
fn jsonl_unknown_param_is_rejected() {
    let ctx = fresh_context();
    let config = RecorderConfig::new("jsonl")
        .with_param("path", "/tmp/never-created.jsonl")
        .with_param("compression", "zstd");
    let err = expect_err(create_recorder(&ctx, &config, None));
    assert!(err.is_config_validation());
}

#[test]
fn toml_config_with_inline_params() {
    let config = RecorderConfig::from_toml_str(
        r#"
        type = "memory"
        [params]
        dataset = "from-toml"
        "#,
    )
    .unwrap();

    let ctx = fresh_context();
    let recorder = create_recorder(&ctx, &config, None).unwrap();
    assert_eq!(recorder.status()["dataset"], "from-toml");
}
